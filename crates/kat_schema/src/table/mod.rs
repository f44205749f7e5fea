//! Hashed property table and property ordering.
//!
//! A [`PropertyTable`] maps external names to the accessors of one type,
//! one [`Slot`] per name. [`order::Sequence`] keeps the written order.

// -----------------------------------------------------------------------------
// Modules

mod table;

pub mod order;

// -----------------------------------------------------------------------------
// Exports

pub use table::{PropertyTable, Role, Slot};
