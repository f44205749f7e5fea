//! Schemas: the ordered properties of a type plus how to construct it.
//!
//! A type opts in by implementing [`Describe`], usually through
//! [`#[derive(Schema)]`](crate::derive::Schema). The description runs once
//! per registry, when the type's codec is first synthesized.
//!
//! ```
//! use kat_schema::schema::{Describe, Expose, SchemaBuilder};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! # kat_schema::impls::impl_structure!(Point, "Point");
//! impl Describe for Point {
//!     fn describe(schema: &mut SchemaBuilder<Self>) {
//!         schema
//!             .field("x", |p| &p.x, |p| &mut p.x, Expose::new().index(0))
//!             .field("y", |p| &p.y, |p| &mut p.y, Expose::new().index(1))
//!             .default_with(Point::default);
//!     }
//! }
//!
//! let schema = SchemaBuilder::<Point>::describe().unwrap();
//! let names: Vec<_> = schema.properties().iter().map(|p| p.name()).collect();
//! assert_eq!(names, ["x", "y"]);
//! ```

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod expose;
mod schema;

// -----------------------------------------------------------------------------
// Exports

pub use builder::SchemaBuilder;
pub use expose::{Expose, Property};
pub use schema::{Construct, Draft, Schema};

use crate::info::Typed;

/// A type whose schema can be built.
pub trait Describe: Typed + Send + Sync + Sized {
    /// Registers the type's properties and construction strategy.
    fn describe(schema: &mut SchemaBuilder<Self>);
}
