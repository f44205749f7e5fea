use alloc::boxed::Box;

use crate::codec::ObjectCodec;
use crate::error::AccessError;
use crate::info::{NonGenericTypeInfoCell, Object, TypeInfo, TypeKind, Typed};

impl Typed for Box<dyn Object> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::new::<Self>("Object", TypeKind::Dynamic).with_synthesize(ObjectCodec::synthesize))
    }

    /// Keeps the value boxed, dropping extra `Box<dyn Object>` layers.
    fn take(mut value: Box<dyn Object>) -> Result<Self, AccessError> {
        while (*value).is::<Self>() {
            let found = (*value).object_info().type_path();
            value = match value.into_any().downcast::<Self>() {
                Ok(inner) => *inner,
                Err(_) => {
                    return Err(AccessError::Value {
                        expected: Self::type_info().type_path(),
                        found,
                    });
                }
            };
        }
        Ok(value)
    }
}
