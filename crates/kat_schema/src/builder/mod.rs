//! The streaming construction protocol.
//!
//! A parser drives a [`Driver`], which owns a chain of [`Builder`]s from the
//! innermost open value up to the root:
//!
//! ```text
//! begin ─► { emit | open ─► … ─► close } ─► close ─► finish
//! ```
//!
//! Each [`Builder`] is a small state machine, `Unopened → Open → Closed`,
//! around an [`Assembly`] holding the codec specific logic. Closing a
//! builder hands its value to its immediate parent and returns that parent.

// -----------------------------------------------------------------------------
// Modules

mod assembly;
mod builder;
mod context;
mod driver;

// -----------------------------------------------------------------------------
// Exports

pub use assembly::Assembly;
pub use builder::{Builder, Closed};
pub use context::Context;
pub use driver::{Driver, Lease};
