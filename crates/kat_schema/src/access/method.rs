use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::access::{Accessor, Caps, ElementCodec, Peek, instance, instance_mut};
use crate::codec::Codec;
use crate::error::AccessError;
use crate::info::{Object, TypeInfo, Typed};

// -----------------------------------------------------------------------------
// GetterAccessor

/// Reads a computed value of type `F` from a `T`.
pub struct GetterAccessor<T, F> {
    get: fn(&T) -> Option<F>,
    element: ElementCodec,
}

impl<T, F> GetterAccessor<T, F> {
    #[inline]
    pub fn new(get: fn(&T) -> Option<F>, codec: Option<Arc<dyn Codec>>) -> Self {
        Self {
            get,
            element: ElementCodec::new(codec),
        }
    }
}

impl<T, F> Accessor for GetterAccessor<T, F>
where
    T: 'static,
    F: Typed + Send + Sync,
{
    #[inline]
    fn caps(&self) -> Caps {
        Caps::READ
    }

    #[inline]
    fn info(&self) -> &'static TypeInfo {
        F::type_info()
    }

    #[inline]
    fn element(&self) -> &ElementCodec {
        &self.element
    }

    fn get<'a>(&self, target: &'a dyn Any) -> Result<Option<Peek<'a>>, AccessError> {
        let target = instance::<T>(target)?;
        Ok((self.get)(target).map(|value| Peek::Owned(Box::new(value))))
    }
}

// -----------------------------------------------------------------------------
// SetterAccessor

/// Passes a value of type `F` to a method of `T`.
///
/// A null is never applied.
pub struct SetterAccessor<T, F> {
    set: fn(&mut T, F),
    element: ElementCodec,
}

impl<T, F> SetterAccessor<T, F> {
    #[inline]
    pub fn new(set: fn(&mut T, F), codec: Option<Arc<dyn Codec>>) -> Self {
        Self {
            set,
            element: ElementCodec::new(codec),
        }
    }
}

impl<T, F> Accessor for SetterAccessor<T, F>
where
    T: 'static,
    F: Typed + Send + Sync,
{
    #[inline]
    fn caps(&self) -> Caps {
        Caps::WRITE
    }

    #[inline]
    fn info(&self) -> &'static TypeInfo {
        F::type_info()
    }

    #[inline]
    fn element(&self) -> &ElementCodec {
        &self.element
    }

    fn set(&self, target: &mut dyn Any, value: Option<Box<dyn Object>>) -> Result<bool, AccessError> {
        let target = instance_mut::<T>(target)?;
        match value {
            Some(value) => {
                (self.set)(target, F::take(value)?);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
