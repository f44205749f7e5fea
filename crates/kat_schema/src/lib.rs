//! Schema and property engine for multi-format object serialization.
//!
//! A type is described once, through [`#[derive(Schema)]`](crate::derive::Schema)
//! or by hand through a [`SchemaBuilder`](crate::schema::SchemaBuilder). The
//! [`Registry`](crate::registry::Registry) turns that description into a
//! [`Codec`](crate::codec::Codec) the first time the type is needed and
//! caches it.
//!
//! Writing walks a schema's ordered properties into a [`Chan`](crate::chan::Chan).
//! Reading is streamed: a parser pushes events into a
//! [`Driver`](crate::builder::Driver), which keeps one
//! [`Builder`](crate::builder::Builder) per open value and hands finished
//! values to their parents as they close.
//!
//! ## Menu
//!
//! - [`info`]: static type descriptors, [`Typed`](crate::info::Typed) and [`Object`](crate::info::Object).
//! - [`registry`]: codec cache and provider chain.
//! - [`table`]: the hashed property table and property ordering.
//! - [`access`]: accessors for fields, getters, setters and constructor arguments.
//! - [`schema`]: property metadata, schemas and their builders.
//! - [`codec`]: the codec contract and the built-in codecs.
//! - [`builder`]: the streaming construction protocol.
//! - [`chan`]: output sinks, including the in-memory [`Tape`](crate::chan::Tape).
//! - [`serde`]: bridges codecs onto `serde` serializers and deserializers.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names `::kat_schema`, which must also resolve inside
// this crate for its own tests.
extern crate self as kat_schema;

// -----------------------------------------------------------------------------
// Crate paths

// Locks, `OnceLock` and `HashMap` come from `std`, so it is always linked.
// The rest is named through `core` and `alloc`.
extern crate alloc;
extern crate std;

// -----------------------------------------------------------------------------
// Modules

mod flags;
mod pool;

pub mod access;
pub mod builder;
pub mod chan;
pub mod codec;
pub mod error;
pub mod impls;
pub mod info;
pub mod registry;
pub mod schema;
pub mod serde;
pub mod table;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use flags::Flags;
pub use pool::{Pool, Pooled};

pub use kat_schema_derive as derive;

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub mod auto_register {
        pub use crate::registry::{ProviderEntry, TypeEntry};
        pub use inventory;
    }
}
