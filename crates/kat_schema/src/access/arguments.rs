use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::access::{Accessor, Caps, ElementCodec};
use crate::codec::Codec;
use crate::error::AccessError;
use crate::info::{Object, TypeInfo, Typed};

// -----------------------------------------------------------------------------
// Arguments

/// Constructor arguments collected while reading.
///
/// Slots left vacant after the last entry are filled with their codec's
/// zero value before the constructor runs.
#[derive(Debug, Default)]
pub struct Arguments {
    slots: Vec<Option<Box<dyn Object>>>,
}

impl Arguments {
    pub fn new(arity: usize) -> Self {
        let mut slots = Vec::with_capacity(arity);
        slots.resize_with(arity, || None);
        Self { slots }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores the argument at `index`, replacing an earlier one.
    pub fn put(&mut self, index: usize, value: Box<dyn Object>) -> Result<(), AccessError> {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(AccessError::Slot(index)),
        }
    }

    #[inline]
    pub fn is_vacant(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(None))
    }

    /// Takes the argument at `index` as an `F`.
    pub fn take<F: Typed>(&mut self, index: usize) -> Result<F, AccessError> {
        let slot = self.slots.get_mut(index).ok_or(AccessError::Slot(index))?;
        let value = slot.take().ok_or(AccessError::Missing(index))?;
        F::take(value)
    }
}

// -----------------------------------------------------------------------------
// ArgumentAccessor

/// Fills constructor argument `position` with an `F`.
pub struct ArgumentAccessor<F> {
    position: usize,
    element: ElementCodec,
    _marker: PhantomData<fn() -> F>,
}

impl<F> ArgumentAccessor<F> {
    #[inline]
    pub fn new(position: usize, codec: Option<Arc<dyn Codec>>) -> Self {
        Self {
            position,
            element: ElementCodec::new(codec),
            _marker: PhantomData,
        }
    }
}

impl<F: Typed + Send + Sync> Accessor for ArgumentAccessor<F> {
    #[inline]
    fn caps(&self) -> Caps {
        Caps::POSITION
    }

    #[inline]
    fn info(&self) -> &'static TypeInfo {
        F::type_info()
    }

    #[inline]
    fn element(&self) -> &ElementCodec {
        &self.element
    }

    #[inline]
    fn position(&self) -> Option<usize> {
        Some(self.position)
    }

    fn put(&self, arguments: &mut Arguments, value: Option<Box<dyn Object>>) -> Result<(), AccessError> {
        let Some(value) = value else {
            return Ok(());
        };
        // Stored as an `F`, so `Option` arguments also take bare values.
        let value = F::take(value)?;
        arguments.put(self.position, Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use super::{ArgumentAccessor, Arguments};
    use crate::access::Accessor;
    use crate::error::AccessError;

    #[test]
    fn slots() {
        let mut arguments = Arguments::new(2);
        let name = ArgumentAccessor::<String>::new(1, None);

        assert!(arguments.is_vacant(1));
        name.put(&mut arguments, Some(Box::new(String::from("kraity")))).unwrap();
        name.put(&mut arguments, None).unwrap();
        assert!(!arguments.is_vacant(1));

        assert_eq!(arguments.take::<String>(1).unwrap(), "kraity");
        assert_eq!(arguments.take::<i32>(0), Err(AccessError::Missing(0)));
        assert_eq!(arguments.take::<i32>(2), Err(AccessError::Slot(2)));
        assert!(matches!(
            name.put(&mut arguments, Some(Box::new(1_u8))),
            Err(AccessError::Value { .. })
        ));

        let nick = ArgumentAccessor::<Option<String>>::new(0, None);
        nick.put(&mut arguments, Some(Box::new(String::from("kat")))).unwrap();
        assert_eq!(arguments.take::<Option<String>>(0).unwrap().as_deref(), Some("kat"));
    }
}
