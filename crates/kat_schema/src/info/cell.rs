//! Containers for static storage of [`TypeInfo`].
//!
//! A non-generic type keeps its info in a [`NonGenericTypeInfoCell`], a
//! plain [`OnceLock`].
//!
//! A `static` inside a generic function is shared by every instantiation,
//! so [`GenericTypeInfoCell`] keys its entries by [`TypeId`] behind a
//! [`RwLock`] and leaks one `TypeInfo` per instantiation.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use kat_utils::TypeIdMap;

use crate::info::TypeInfo;

/// Static storage of a non-generic type's [`TypeInfo`].
///
/// ```
/// use kat_schema::info::{NonGenericTypeInfoCell, TypeInfo, TypeKind, Typed};
///
/// struct Marker;
///
/// impl Typed for Marker {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::new::<Self>("Marker", TypeKind::Scalar))
///     }
/// }
///
/// assert_eq!(Marker::type_info().type_name(), "Marker");
/// ```
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored info, creating it with `f` on first use.
    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        self.0.get_or_init(f)
    }
}

/// Static storage of [`TypeInfo`] for each instantiation of a generic type.
pub struct GenericTypeInfoCell(RwLock<TypeIdMap<&'static TypeInfo>>);

impl GenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the info stored for `G`, creating it with `f` on first use.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    // Separate to reduce code compilation times
    #[inline(never)]
    fn get_or_insert_by_type_id(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> TypeInfo,
    ) -> &'static TypeInfo {
        let found = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied();

        match found {
            Some(info) => info,
            None => {
                let info = f();
                *self
                    .0
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_or_insert(type_id, || Box::leak(Box::new(info)))
            }
        }
    }
}
