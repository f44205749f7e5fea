//! Error types.
//!
//! - [`SchemaError`]: a type's schema could not be built. Fatal for that
//!   type until [`Registry::retry`](crate::registry::Registry::retry).
//! - [`ResolutionError`]: no codec for a type.
//! - [`CoercionError`]: a token does not fit the target scalar.
//! - [`ProtocolError`]: a builder method was called out of sequence.
//! - [`AccessError`]: an accessor was used with the wrong instance or value.
//! - [`CodecError`]: everything a read or write can fail with.

use alloc::boxed::Box;
use alloc::string::String;

use thiserror::Error;

// -----------------------------------------------------------------------------
// SchemaError

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("`{0}` has no construction strategy")]
    NoConstructor(&'static str),

    #[error("constructor argument {index} of `{ty}` has no accessor")]
    MissingArgument { ty: &'static str, index: usize },

    #[error("constructor argument {index} of `{ty}` is declared twice")]
    DuplicateArgument { ty: &'static str, index: usize },

    #[error("constructor argument {index} of `{ty}` is beyond its arity {arity}")]
    ArgumentOutOfRange { ty: &'static str, index: usize, arity: usize },

    #[error("`{0}` has no schema description")]
    Undescribed(&'static str),
}

// -----------------------------------------------------------------------------
// ResolutionError

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolutionError {
    #[error("no codec found for `{0}`")]
    NotFound(&'static str),

    #[error("codec lookup for `{0}` was vetoed")]
    Vetoed(&'static str),

    #[error("failed to build the schema of `{ty}`: {error}")]
    Schema {
        ty: &'static str,
        #[source]
        error: SchemaError,
    },
}

// -----------------------------------------------------------------------------
// CoercionError

/// A raw token cannot be turned into the expected scalar.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("cannot coerce {found} into `{expected}`")]
pub struct CoercionError {
    pub expected: &'static str,
    pub found: String,
}

// -----------------------------------------------------------------------------
// ProtocolError

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtocolError {
    #[error("builder is already working")]
    AlreadyOpen,

    #[error("builder is already closed")]
    AlreadyClosed,

    #[error("builder is not open")]
    NotOpen,

    #[error("driver has no open builder")]
    Idle,

    #[error("driver root has not closed")]
    Unfinished,
}

// -----------------------------------------------------------------------------
// AccessError

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AccessError {
    #[error("accessor cannot read")]
    NotReadable,

    #[error("accessor cannot write")]
    NotWritable,

    #[error("accessor is not a constructor argument")]
    NotPositional,

    #[error("expected an instance of `{expected}`")]
    Instance { expected: &'static str },

    #[error("expected a value of `{expected}`, found `{found}`")]
    Value {
        expected: &'static str,
        found: &'static str,
    },

    #[error("constructor argument {0} is out of range")]
    Slot(usize),

    #[error("constructor argument {0} was never supplied")]
    Missing(usize),
}

// -----------------------------------------------------------------------------
// CodecError

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CodecError {
    #[error("`{ty}` does not support {op}")]
    Unsupported { ty: &'static str, op: &'static str },

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    NotFound(#[from] ResolutionError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("unknown property `{0}`")]
    Unknown(Box<str>),

    #[error("{0}")]
    Custom(String),
}

impl CodecError {
    #[inline]
    pub(crate) const fn unsupported(ty: &'static str, op: &'static str) -> Self {
        Self::Unsupported { ty, op }
    }

    /// Returns `true` for [`CodecError::Unsupported`].
    #[inline]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns `true` for [`CodecError::Coercion`].
    #[inline]
    pub const fn is_coercion(&self) -> bool {
        matches!(self, Self::Coercion(_))
    }
}
