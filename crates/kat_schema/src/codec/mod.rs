//! The codec contract and the built-in codecs.
//!
//! A [`Codec`] reads and writes values of one type:
//!
//! - [`Codec::read`] turns a single [`Token`] into a value;
//! - [`Codec::builder`] returns a [`Builder`] for structural reads;
//! - [`Codec::write`] writes a value into a [`Chan`].
//!
//! Asking a scalar codec for a builder, or a structural codec to read a
//! token, fails with [`CodecError::Unsupported`], which callers may test
//! cheaply with [`CodecError::is_unsupported`].

// -----------------------------------------------------------------------------
// Modules

mod list;
mod map;
mod object;
mod option;
mod scalar;
mod schema;
mod token;

// -----------------------------------------------------------------------------
// Exports

pub use list::ListCodec;
pub use map::{MapCodec, StringMap};
pub use object::ObjectCodec;
pub use option::OptionCodec;
pub use scalar::{Scalar, ScalarCodec};
pub use schema::SchemaCodec;
pub use token::Token;

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::builder::{Builder, Context};
use crate::chan::Chan;
use crate::Flags;
use crate::error::{AccessError, CodecError};
use crate::info::{Object, TypeInfo, Typed};
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// Shape

/// How a codec's values appear in a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// A single token.
    Scalar,
    /// Named entries.
    Object,
    /// Unnamed, ordered entries.
    Sequence,
}

// -----------------------------------------------------------------------------
// Codec

/// Reads and writes values of one type.
pub trait Codec: Send + Sync + 'static {
    /// The type this codec handles.
    fn info(&self) -> &'static TypeInfo;

    #[inline]
    fn shape(&self) -> Shape {
        Shape::Scalar
    }

    /// Decodes one raw token.
    fn read(&self, cx: &Context, token: Token<'_>) -> Result<Box<dyn Object>, CodecError> {
        let _ = (cx, token);
        Err(CodecError::unsupported(self.info().type_path(), "scalar reads"))
    }

    /// Returns an unopened builder for a nested value.
    fn builder(&self, cx: &Context) -> Result<Builder, CodecError> {
        let _ = cx;
        Err(CodecError::unsupported(self.info().type_path(), "structural reads"))
    }

    /// Writes `value` into `chan`.
    fn write(&self, chan: &mut dyn Chan, value: &dyn Object) -> Result<(), CodecError>;

    /// The value used when a token cannot be coerced, or a constructor
    /// argument was never supplied.
    #[inline]
    fn zero(&self) -> Option<Box<dyn Object>> {
        None
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Resolves the codec of `value`'s runtime type, looking through
/// `Box<dyn Object>`.
pub fn runtime<'v>(
    registry: &Registry,
    value: &'v dyn Object,
) -> Result<(Arc<dyn Codec>, &'v dyn Object), CodecError> {
    let value = value.innermost();
    let codec = registry.try_resolve(value.object_info())?;
    Ok((codec, value))
}

/// Writes one keyed or positional entry of a container.
///
/// `declared` is the codec of the entry's declared type. When it is absent
/// or dynamic the codec comes from the runtime type, and object-shaped
/// values carry their type's space as the discriminator.
pub fn write_entry(
    chan: &mut dyn Chan,
    alias: Option<&str>,
    declared: Option<&Arc<dyn Codec>>,
    value: &dyn Object,
) -> Result<(), CodecError> {
    let (codec, value) = match declared {
        Some(codec) if !codec.info().is_dynamic() => {
            if !chan.flags().contains(Flags::WRITE_SPACE) {
                return chan.set(alias, None, &**codec, value);
            }
            (codec.clone(), value)
        }
        _ => runtime(chan.registry(), value)?,
    };
    let space = match codec.shape() {
        Shape::Object => Some(codec.info().space()),
        _ => None,
    };
    chan.set(alias, space, &*codec, value)
}

/// Reads a token, falling back to the codec's zero value when it cannot be
/// coerced and `required` is unset.
pub(crate) fn read_or_zero(
    codec: &dyn Codec,
    cx: &Context,
    token: Token<'_>,
    required: bool,
) -> Result<Option<Box<dyn Object>>, CodecError> {
    match codec.read(cx, token) {
        Ok(value) => Ok(Some(value)),
        Err(CodecError::Coercion(error)) if !required => {
            log::warn!("{error}, using the zero value");
            Ok(codec.zero())
        }
        Err(error) => Err(error),
    }
}

/// Borrows the concrete value behind `value`.
pub(crate) fn downcast<T: Typed>(value: &dyn Object) -> Result<&T, AccessError> {
    let value = value.innermost();
    value.downcast_ref().ok_or_else(|| AccessError::Value {
        expected: T::type_info().type_path(),
        found: value.object_info().type_path(),
    })
}

/// Returns the builder of a nested value declared with `declared`.
///
/// A `space` naming a subtype of the declared type selects the subtype's
/// codec. `None` means the value cannot be built and should be skipped.
pub(crate) fn nested(
    cx: &Context,
    declared: &Arc<dyn Codec>,
    space: Option<&str>,
) -> Result<Option<Builder>, CodecError> {
    let registry = cx.registry();
    let codec = match space.and_then(|space| registry.subtype(declared.info(), space)) {
        Some(info) if info != declared.info() => registry.try_resolve(info)?,
        _ => declared.clone(),
    };

    match codec.builder(cx) {
        Ok(builder) => Ok(Some(builder)),
        Err(error) if error.is_unsupported() && !cx.is_strict() => {
            log::debug!("skipping a nested value: {error}");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
