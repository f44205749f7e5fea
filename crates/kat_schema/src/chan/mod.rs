//! Output sinks.
//!
//! A [`Chan`] receives what a [`Codec`] writes and knows nothing of the
//! encoding. The calls a codec makes describe the *current value*:
//!
//! - a scalar value is a single [`emit`](Chan::emit);
//! - a structure is [`open`](Chan::open), one [`set`](Chan::set) or
//!   [`null`](Chan::null) per entry, then [`close`](Chan::close).
//!
//! [`set`](Chan::set) hands the entry's value to a codec, which writes it
//! with the same calls one level down.

// -----------------------------------------------------------------------------
// Modules

mod tape;

// -----------------------------------------------------------------------------
// Exports

pub use tape::{Event, Tape};

use alloc::format;

use crate::Flags;
use crate::codec::{Codec, Shape, Token};
use crate::error::CodecError;
use crate::info::Object;
use crate::registry::Registry;

// -----------------------------------------------------------------------------
// Chan

/// The sink a [`Codec`] writes into.
pub trait Chan {
    /// Registry used to resolve the codecs of runtime types.
    fn registry(&self) -> &Registry;

    fn flags(&self) -> Flags;

    /// Writes the current value as a single token.
    fn emit(&mut self, token: Token<'_>) -> Result<(), CodecError>;

    /// Starts the current value as a structure.
    fn open(&mut self, shape: Shape) -> Result<(), CodecError>;

    /// Ends the structure started by the last unmatched [`open`](Chan::open).
    fn close(&mut self) -> Result<(), CodecError>;

    /// Writes an entry of the open structure.
    ///
    /// `alias` is `None` in sequences. `space` is the discriminator to write
    /// ahead of an object's entries.
    fn set(
        &mut self,
        alias: Option<&str>,
        space: Option<&str>,
        codec: &dyn Codec,
        value: &dyn Object,
    ) -> Result<(), CodecError>;

    /// Writes a null entry.
    fn null(&mut self, alias: Option<&str>) -> Result<(), CodecError>;
}

// -----------------------------------------------------------------------------
// Inline

/// Writes the entries of a structure straight into the enclosing one.
///
/// The structure's own `open` and `close` are dropped.
pub(crate) struct Inline<'c> {
    chan: &'c mut dyn Chan,
}

impl<'c> Inline<'c> {
    #[inline]
    pub(crate) fn new(chan: &'c mut dyn Chan) -> Self {
        Self { chan }
    }
}

impl Chan for Inline<'_> {
    #[inline]
    fn registry(&self) -> &Registry {
        self.chan.registry()
    }

    #[inline]
    fn flags(&self) -> Flags {
        self.chan.flags()
    }

    fn emit(&mut self, token: Token<'_>) -> Result<(), CodecError> {
        Err(CodecError::Custom(format!("cannot unwrap the scalar {token}")))
    }

    #[inline]
    fn open(&mut self, _: Shape) -> Result<(), CodecError> {
        Ok(())
    }

    #[inline]
    fn close(&mut self) -> Result<(), CodecError> {
        Ok(())
    }

    #[inline]
    fn set(
        &mut self,
        alias: Option<&str>,
        space: Option<&str>,
        codec: &dyn Codec,
        value: &dyn Object,
    ) -> Result<(), CodecError> {
        self.chan.set(alias, space, codec, value)
    }

    #[inline]
    fn null(&mut self, alias: Option<&str>) -> Result<(), CodecError> {
        self.chan.null(alias)
    }
}
