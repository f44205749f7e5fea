use alloc::boxed::Box;

use crate::builder::{Builder, Context};
use crate::codec::Token;
use crate::error::CodecError;
use crate::info::Object;

/// The codec specific half of a [`Builder`].
///
/// The builder enforces the protocol and only forwards calls made while it
/// is open. `alias` is the entry's name when the format has one, `index`
/// its position when the format has one.
pub trait Assembly: Send + 'static {
    /// Called once from `init`, before any other call.
    fn on_create(&mut self, cx: &Context) -> Result<(), CodecError> {
        let _ = cx;
        Ok(())
    }

    /// A scalar entry was read.
    fn on_emit(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError>;

    /// A nested entry begins.
    ///
    /// Returns the unopened builder of the nested value, or `None` when the
    /// entry should be skipped. The value the child builds comes back
    /// through [`on_child`](Assembly::on_child).
    fn on_open(
        &mut self,
        cx: &Context,
        alias: Option<&str>,
        index: Option<usize>,
        space: Option<&str>,
    ) -> Result<Option<Builder>, CodecError>;

    /// The child opened by the last [`on_open`](Assembly::on_open) closed
    /// with `value`.
    fn on_child(&mut self, cx: &Context, value: Box<dyn Object>) -> Result<(), CodecError>;

    /// Produces the finished value.
    fn build(self: Box<Self>, cx: &Context) -> Result<Box<dyn Object>, CodecError>;
}
