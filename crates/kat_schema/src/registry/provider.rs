use alloc::sync::Arc;
use core::fmt;

use crate::codec::Codec;
use crate::error::SchemaError;
use crate::info::TypeInfo;
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// Lookup

/// A provider's answer.
pub enum Lookup {
    /// The codec of the type. It is cached by the registry.
    Hit(Arc<dyn Codec>),
    /// Not this provider's type, ask the next one.
    Miss,
    /// The type has no codec. Stops the search.
    Veto,
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit(codec) => f.debug_tuple("Hit").field(&codec.info().type_path()).finish(),
            Self::Miss => f.write_str("Miss"),
            Self::Veto => f.write_str("Veto"),
        }
    }
}

// -----------------------------------------------------------------------------
// Provider

/// Builds codecs on a registry cache miss.
///
/// Providers are asked in descending [`grade`](Self::grade), the first
/// [`Lookup::Hit`] wins.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use kat_schema::codec::ScalarCodec;
/// use kat_schema::error::SchemaError;
/// use kat_schema::info::{TypeInfo, Typed};
/// use kat_schema::registry::{Lookup, Provider, Registry, RegistryBuilder};
///
/// struct NoFloats;
///
/// impl Provider for NoFloats {
///     fn grade(&self) -> i32 {
///         10
///     }
///
///     fn try_resolve(&self, info: &'static TypeInfo, _: Option<&str>, _: &Registry) -> Result<Lookup, SchemaError> {
///         Ok(if info.is::<f64>() { Lookup::Veto } else { Lookup::Miss })
///     }
/// }
///
/// let registry = RegistryBuilder::new().provider(Arc::new(NoFloats)).build();
/// assert!(registry.resolve(f64::type_info()).is_none());
/// assert!(registry.resolve(i64::type_info()).is_some());
/// ```
pub trait Provider: Send + Sync + 'static {
    /// Priority, higher is asked first.
    #[inline]
    fn grade(&self) -> i32 {
        0
    }

    /// Providers returning `false` are dropped when the registry is built.
    #[inline]
    fn alive(&self) -> bool {
        true
    }

    /// Looks up the codec of `info`.
    ///
    /// `hint` is the discriminator the value was read with, if any. An
    /// error poisons the type in `registry`.
    fn try_resolve(
        &self,
        info: &'static TypeInfo,
        hint: Option<&str>,
        registry: &Registry,
    ) -> Result<Lookup, SchemaError>;
}

// -----------------------------------------------------------------------------
// DefaultProvider

/// Builds a codec from [`TypeInfo::synthesize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl DefaultProvider {
    /// Low enough for any user provider to come first.
    pub const GRADE: i32 = 0x8888_8888_u32 as i32;
}

impl Provider for DefaultProvider {
    #[inline]
    fn grade(&self) -> i32 {
        Self::GRADE
    }

    fn try_resolve(&self, info: &'static TypeInfo, _: Option<&str>, registry: &Registry) -> Result<Lookup, SchemaError> {
        match info.synthesize() {
            Some(synthesize) => synthesize(registry).map(Lookup::Hit),
            None => Ok(Lookup::Miss),
        }
    }
}

// -----------------------------------------------------------------------------
// auto_register

/// A provider submitted with [`submit_provider!`](crate::submit_provider).
#[cfg(feature = "auto_register")]
pub struct ProviderEntry(pub fn() -> Arc<dyn Provider>);

/// A type whose spaces are embedded in every new registry.
#[cfg(feature = "auto_register")]
pub struct TypeEntry(pub fn() -> &'static TypeInfo);

#[cfg(feature = "auto_register")]
inventory::collect!(ProviderEntry);

#[cfg(feature = "auto_register")]
inventory::collect!(TypeEntry);

/// Submits a provider to every registry built with auto registration.
///
/// The argument is a `fn() -> Arc<dyn Provider>`. Without the
/// `auto_register` feature the macro expands to nothing.
///
/// ```
/// use std::sync::Arc;
///
/// use kat_schema::error::SchemaError;
/// use kat_schema::info::TypeInfo;
/// use kat_schema::registry::{Lookup, Provider, Registry};
///
/// struct Quiet;
///
/// impl Provider for Quiet {
///     fn try_resolve(&self, _: &'static TypeInfo, _: Option<&str>, _: &Registry) -> Result<Lookup, SchemaError> {
///         Ok(Lookup::Miss)
///     }
/// }
///
/// fn quiet() -> Arc<dyn Provider> {
///     Arc::new(Quiet)
/// }
///
/// kat_schema::submit_provider!(quiet);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! submit_provider {
    ($make:path) => {
        $crate::__macro_exports::auto_register::inventory::submit! {
            $crate::__macro_exports::auto_register::ProviderEntry($make)
        }
    };
}

/// Submits a provider to every registry built with auto registration.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! submit_provider {
    ($make:path) => {};
}
