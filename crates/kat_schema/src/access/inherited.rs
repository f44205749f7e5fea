use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use crate::access::{Accessor, Caps, ElementCodec, Peek, instance, instance_mut};
use crate::error::AccessError;
use crate::info::{Object, TypeInfo};

/// An accessor of an embedded ancestor `B`, seen from a `T`.
///
/// Constructor arguments of the ancestor do not carry over.
pub struct Inherited<T, B> {
    inner: Arc<dyn Accessor>,
    up: fn(&T) -> &B,
    up_mut: fn(&mut T) -> &mut B,
}

impl<T, B> Inherited<T, B> {
    #[inline]
    pub fn new(inner: Arc<dyn Accessor>, up: fn(&T) -> &B, up_mut: fn(&mut T) -> &mut B) -> Self {
        Self { inner, up, up_mut }
    }

    /// The ancestor's own accessor.
    #[inline]
    pub fn inner(&self) -> &Arc<dyn Accessor> {
        &self.inner
    }
}

impl<T, B> Accessor for Inherited<T, B>
where
    T: 'static,
    B: 'static,
{
    #[inline]
    fn caps(&self) -> Caps {
        self.inner.caps() - Caps::POSITION
    }

    #[inline]
    fn info(&self) -> &'static TypeInfo {
        self.inner.info()
    }

    #[inline]
    fn element(&self) -> &ElementCodec {
        self.inner.element()
    }

    fn get<'a>(&self, target: &'a dyn Any) -> Result<Option<Peek<'a>>, AccessError> {
        let target = instance::<T>(target)?;
        self.inner.get((self.up)(target))
    }

    fn set(&self, target: &mut dyn Any, value: Option<Box<dyn Object>>) -> Result<bool, AccessError> {
        let target = instance_mut::<T>(target)?;
        self.inner.set((self.up_mut)(target), value)
    }
}
