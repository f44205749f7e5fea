use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::BuildHasher;
use std::collections::HashMap;

use crate::codec::{ListCodec, MapCodec, OptionCodec};
use crate::error::AccessError;
use crate::info::{GenericTypeInfoCell, Object, TypeInfo, TypeKind, Typed};

impl<T: Typed + Send + Sync> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::new::<Self>("Option", TypeKind::Optional).with_synthesize(OptionCodec::<T>::synthesize)
        })
    }

    /// Accepts an `Option<T>` as well as a bare `T`.
    fn take(value: Box<dyn Object>) -> Result<Self, AccessError> {
        if (*value).is::<Self>() {
            let found = (*value).object_info().type_path();
            return value
                .into_any()
                .downcast::<Self>()
                .map(|value| *value)
                .map_err(|_| AccessError::Value {
                    expected: Self::type_info().type_path(),
                    found,
                });
        }
        T::take(value).map(Some)
    }
}

impl<T: Typed + Send + Sync> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::new::<Self>("Vec", TypeKind::Sequence).with_synthesize(ListCodec::<T>::synthesize)
        })
    }
}

impl<V: Typed + Send + Sync> Typed for BTreeMap<String, V> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::new::<Self>("BTreeMap", TypeKind::Map).with_synthesize(MapCodec::<Self>::synthesize)
        })
    }
}

impl<V, S> Typed for HashMap<String, V, S>
where
    V: Typed + Send + Sync,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::new::<Self>("HashMap", TypeKind::Map).with_synthesize(MapCodec::<Self>::synthesize)
        })
    }
}
