//! Static type descriptors.
//!
//! - [`TypeInfo`]: identity, names, aliases ("spaces"), parents and the
//!   hook that builds the type's codec.
//! - [`Typed`]: gives a type its `&'static TypeInfo`.
//! - [`Object`]: the object-safe view of any `Typed` value, used wherever a
//!   value's type is only known at runtime.
//! - [`NonGenericTypeInfoCell`], [`GenericTypeInfoCell`]: static storage for
//!   implementing [`Typed`].

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod type_info;
mod typed;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericTypeInfoCell, NonGenericTypeInfoCell};
pub use type_info::{Synthesize, TypeInfo, TypeKind};
pub use typed::{Object, Typed};
