use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::error::AccessError;
use crate::info::TypeInfo;

// -----------------------------------------------------------------------------
// Typed

/// Static access to a type's [`TypeInfo`].
///
/// Implemented by [`#[derive(Schema)]`](crate::derive::Schema) and, in
/// [`impls`](crate::impls), for the built-in scalars and collections.
pub trait Typed: 'static {
    fn type_info() -> &'static TypeInfo;

    /// Recovers `Self` from a value produced by a codec.
    ///
    /// The default downcasts. `Box<dyn Object>` overrides it to keep the
    /// value boxed as is.
    fn take(value: Box<dyn Object>) -> Result<Self, AccessError>
    where
        Self: Sized,
    {
        // `Box<dyn Object>` is an `Object` too, deref to reach the value.
        let found = (*value).object_info().type_path();
        value
            .into_any()
            .downcast::<Self>()
            .map(|value| *value)
            .map_err(|_| AccessError::Value {
                expected: Self::type_info().type_path(),
                found,
            })
    }
}

// -----------------------------------------------------------------------------
// Object

/// A [`Typed`] value whose type is only known at runtime.
///
/// Every value a codec reads comes out as a `Box<dyn Object>`, and every
/// value it writes goes in as a `&dyn Object`.
pub trait Object: Any + Send + Sync {
    /// The runtime type's info.
    fn object_info(&self) -> &'static TypeInfo;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T: Typed + Send + Sync> Object for T {
    #[inline]
    fn object_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn Object {
    /// Returns `true` if the runtime type is `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Looks through any number of `Box<dyn Object>` layers.
    pub fn innermost(&self) -> &dyn Object {
        let mut value = self;
        while let Some(inner) = value.downcast_ref::<Box<dyn Object>>() {
            value = &**inner;
        }
        value
    }
}

impl fmt::Debug for dyn Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.innermost().object_info().type_path())
    }
}
