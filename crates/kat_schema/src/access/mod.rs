//! Accessors: one contract for fields, getters, setters and constructor
//! arguments.
//!
//! An [`Accessor`] works on type-erased instances, so a
//! [`PropertyTable`](crate::table::PropertyTable) can hold the accessors of
//! any type behind `Arc<dyn Accessor>`. What it can do is told by its
//! [`Caps`].

// -----------------------------------------------------------------------------
// Modules

mod arguments;
mod element;
mod field;
mod inherited;
mod method;

// -----------------------------------------------------------------------------
// Exports

pub use arguments::{ArgumentAccessor, Arguments};
pub use element::ElementCodec;
pub use field::{FieldAccessor, OptionAccessor};
pub use inherited::Inherited;
pub use method::{GetterAccessor, SetterAccessor};

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;

use bitflags::bitflags;

use crate::codec::Codec;
use crate::error::{AccessError, ResolutionError};
use crate::info::{Object, TypeInfo};
use crate::registry::Registry;

bitflags! {
    /// What an [`Accessor`] supports.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Caps: u8 {
        /// [`Accessor::get`].
        const READ     = 1 << 0;
        /// [`Accessor::set`].
        const WRITE    = 1 << 1;
        /// [`Accessor::put`].
        const POSITION = 1 << 2;
    }
}

// -----------------------------------------------------------------------------
// Peek

/// A value read through an accessor: borrowed from a field, or computed by
/// a getter.
pub enum Peek<'a> {
    Ref(&'a dyn Object),
    Owned(Box<dyn Object>),
}

impl Peek<'_> {
    #[inline]
    pub fn as_object(&self) -> &dyn Object {
        match self {
            Self::Ref(value) => *value,
            Self::Owned(value) => &**value,
        }
    }
}

impl core::fmt::Debug for Peek<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self.as_object(), f)
    }
}

// -----------------------------------------------------------------------------
// Accessor

/// Reads and/or writes one property of a type-erased instance.
///
/// Every method a capability does not cover fails with the matching
/// [`AccessError`].
pub trait Accessor: Send + Sync + 'static {
    fn caps(&self) -> Caps;

    /// Declared type of the property.
    fn info(&self) -> &'static TypeInfo;

    /// Codec of the declared type, resolved on first use.
    fn element(&self) -> &ElementCodec;

    /// Reads the property. `None` is an absent value.
    fn get<'a>(&self, instance: &'a dyn Any) -> Result<Option<Peek<'a>>, AccessError> {
        let _ = instance;
        Err(AccessError::NotReadable)
    }

    /// Writes the property. Returns `false` when the value was not applied,
    /// such as a null for a property that cannot hold one.
    fn set(&self, instance: &mut dyn Any, value: Option<Box<dyn Object>>) -> Result<bool, AccessError> {
        let _ = (instance, value);
        Err(AccessError::NotWritable)
    }

    /// Constructor argument position.
    #[inline]
    fn position(&self) -> Option<usize> {
        None
    }

    /// Fills this accessor's constructor argument.
    fn put(&self, arguments: &mut Arguments, value: Option<Box<dyn Object>>) -> Result<(), AccessError> {
        let _ = (arguments, value);
        Err(AccessError::NotPositional)
    }

    /// Resolves and caches the element codec.
    #[inline]
    fn prepare(&self, registry: &Registry) -> Result<&Arc<dyn Codec>, ResolutionError> {
        self.element().resolve(registry, self.info())
    }
}

/// Downcasts a type-erased instance.
#[inline]
pub(crate) fn instance<T: Any>(instance: &dyn Any) -> Result<&T, AccessError> {
    instance.downcast_ref().ok_or(AccessError::Instance {
        expected: core::any::type_name::<T>(),
    })
}

#[inline]
pub(crate) fn instance_mut<T: Any>(instance: &mut dyn Any) -> Result<&mut T, AccessError> {
    instance.downcast_mut().ok_or(AccessError::Instance {
        expected: core::any::type_name::<T>(),
    })
}
