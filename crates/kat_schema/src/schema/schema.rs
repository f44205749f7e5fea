use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use crate::access::{Accessor, Arguments};
use crate::error::{AccessError, CodecError};
use crate::info::TypeInfo;
use crate::schema::Property;
use crate::table::{PropertyTable, Role, Slot};

// -----------------------------------------------------------------------------
// Draft

/// A mutable proxy that setters fill and that finishes into the target type.
pub struct Draft<T> {
    new: Box<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>,
    finish: Box<dyn Fn(Box<dyn Any + Send>) -> Result<T, CodecError> + Send + Sync>,
}

impl<T: 'static> Draft<T> {
    pub fn new<D: Send + 'static>(new: fn() -> D, finish: fn(D) -> Result<T, CodecError>) -> Self {
        Self {
            new: Box::new(move || Box::new(new()) as Box<dyn Any + Send>),
            finish: Box::new(move |draft| match draft.downcast::<D>() {
                Ok(draft) => finish(*draft),
                Err(_) => Err(AccessError::Instance {
                    expected: core::any::type_name::<D>(),
                }
                .into()),
            }),
        }
    }

    /// Creates an empty draft.
    #[inline]
    pub fn create(&self) -> Box<dyn Any + Send> {
        (self.new)()
    }

    #[inline]
    pub fn finish(&self, draft: Box<dyn Any + Send>) -> Result<T, CodecError> {
        (self.finish)(draft)
    }
}

// -----------------------------------------------------------------------------
// Construct

/// How a schema creates instances while reading.
pub enum Construct<T> {
    /// Create a default instance, then apply setters.
    Default(fn() -> T),
    /// Collect positional arguments, then call the constructor.
    Arguments {
        arity: usize,
        make: fn(&mut Arguments) -> Result<T, CodecError>,
    },
    /// Fill a draft through setters, then finish it.
    Draft(Draft<T>),
}

impl<T> Construct<T> {
    /// The role of the accessors used to apply entries.
    #[inline]
    pub fn role(&self) -> Role {
        match self {
            Self::Arguments { .. } => Role::Argument,
            _ => Role::Setter,
        }
    }
}

impl<T> fmt::Debug for Construct<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(_) => f.write_str("Default"),
            Self::Arguments { arity, .. } => f.debug_struct("Arguments").field("arity", arity).finish(),
            Self::Draft(_) => f.write_str("Draft"),
        }
    }
}

// -----------------------------------------------------------------------------
// Schema

/// The built schema of a `T`.
///
/// Holds the written properties in order, the table of every readable name,
/// and the construction strategy.
pub struct Schema<T> {
    pub(crate) info: &'static TypeInfo,
    pub(crate) properties: Box<[Property]>,
    pub(crate) table: PropertyTable,
    pub(crate) construct: Construct<T>,
    // Argument accessors by position.
    pub(crate) arguments: Box<[Arc<dyn Accessor>]>,
}

impl<T> Schema<T> {
    #[inline]
    pub fn info(&self) -> &'static TypeInfo {
        self.info
    }

    /// Written properties, in order.
    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    #[inline]
    pub fn table(&self) -> &PropertyTable {
        &self.table
    }

    #[inline]
    pub fn construct(&self) -> &Construct<T> {
        &self.construct
    }

    /// The `index`-th written property.
    #[inline]
    pub fn nth(&self, index: usize) -> Option<&Property> {
        self.properties.get(index)
    }

    /// Constructor argument accessors, by position.
    #[inline]
    pub fn arguments(&self) -> &[Arc<dyn Accessor>] {
        &self.arguments
    }

    #[inline]
    pub fn getter(&self, name: &str, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.table.getter(name, fold)
    }

    #[inline]
    pub fn setter(&self, name: &str, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.table.setter(name, fold)
    }

    #[inline]
    pub fn argument(&self, name: &str, fold: bool) -> Option<&Arc<dyn Accessor>> {
        self.table.argument(name, fold)
    }

    /// The slot applying entries named `name` under the construction
    /// strategy.
    #[inline]
    pub fn writer(&self, name: &str, fold: bool) -> Option<&Slot> {
        self.table.lookup_slot(name, self.construct.role(), fold)
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type", &self.info.type_path())
            .field("properties", &self.properties)
            .field("construct", &self.construct)
            .finish_non_exhaustive()
    }
}
