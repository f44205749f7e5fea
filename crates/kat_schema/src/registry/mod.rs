//! Codec cache and provider chain.
//!
//! ## Menu
//!
//! - [`Registry`]: maps a [`TypeInfo`](crate::info::TypeInfo), and an
//!   optional discriminator, to a [`Codec`](crate::codec::Codec).
//! - [`RegistryBuilder`]: assembles a registry from providers.
//! - [`Provider`]: the extension point building codecs, answering with a
//!   [`Lookup`].
//! - [`DefaultProvider`]: builds codecs from the type's own synthesis hook,
//!   consulted last.
//!
//! ## auto_register
//!
//! With the `auto_register` feature, providers submitted with
//! [`submit_provider!`](crate::submit_provider) and types deriving
//! `Schema` with `#[kat(auto_register)]` are collected through
//! [`inventory`](https://docs.rs/inventory) when a registry is built.
//! Registered types are known by their spaces before their first use,
//! which polymorphic reads need.

// -----------------------------------------------------------------------------
// Modules

mod provider;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use provider::{DefaultProvider, Lookup, Provider};
pub use registry::{Registry, RegistryBuilder};

#[cfg(feature = "auto_register")]
pub use provider::{ProviderEntry, TypeEntry};
