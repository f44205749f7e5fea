use alloc::boxed::Box;
use core::fmt;

use crate::builder::{Assembly, Context};
use crate::codec::Token;
use crate::error::{CodecError, ProtocolError};
use crate::info::Object;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unopened,
    Open,
    Closed,
}

/// What [`Builder::close`] returns.
pub enum Closed {
    /// The builder had a parent, which is open again.
    Holder(Box<Builder>),
    /// The root closed, with its value if it was committed and built.
    Root(Option<Box<dyn Object>>),
}

impl Closed {
    /// Returns the parent, or `None` at the root.
    #[inline]
    pub fn into_holder(self) -> Option<Box<Builder>> {
        match self {
            Self::Holder(holder) => Some(holder),
            Self::Root(_) => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Builder

/// The per-value state machine a parser drives.
///
/// - [`init`](Self::init): `Unopened → Open`. Sets the parent and captures
///   the context. A second `init` fails with [`ProtocolError::AlreadyOpen`].
/// - [`on_open`](Self::on_open), [`on_emit`](Self::on_emit): only while open.
/// - [`close`](Self::close): `Open → Closed`. Hands the value to the parent
///   and returns the parent.
pub struct Builder {
    state: State,
    holder: Option<Box<Builder>>,
    context: Option<Context>,
    assembly: Option<Box<dyn Assembly>>,
}

impl Builder {
    /// Wraps an assembly into an unopened builder.
    #[inline]
    pub fn new(assembly: impl Assembly) -> Self {
        Self::boxed(Box::new(assembly))
    }

    #[inline]
    pub fn boxed(assembly: Box<dyn Assembly>) -> Self {
        Self {
            state: State::Unopened,
            holder: None,
            context: None,
            assembly: Some(assembly),
        }
    }

    #[inline]
    pub fn is_unopened(&self) -> bool {
        self.state == State::Unopened
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// The context captured at `init`.
    #[inline]
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// The parent builder.
    #[inline]
    pub fn holder(&self) -> Option<&Builder> {
        self.holder.as_deref()
    }

    fn ensure_open(&self) -> Result<(), ProtocolError> {
        match self.state {
            State::Open => Ok(()),
            State::Unopened => Err(ProtocolError::NotOpen),
            State::Closed => Err(ProtocolError::AlreadyClosed),
        }
    }

    // Valid whenever `ensure_open` passed.
    fn parts(&mut self) -> Result<(&Context, &mut dyn Assembly), ProtocolError> {
        match (&self.context, &mut self.assembly) {
            (Some(cx), Some(assembly)) => Ok((cx, &mut **assembly)),
            _ => Err(ProtocolError::NotOpen),
        }
    }

    /// Opens the builder under `holder`.
    pub fn init(&mut self, holder: Option<Box<Builder>>, context: Context) -> Result<(), CodecError> {
        match self.state {
            State::Unopened => {}
            State::Open => return Err(ProtocolError::AlreadyOpen.into()),
            State::Closed => return Err(ProtocolError::AlreadyClosed.into()),
        }

        self.state = State::Open;
        self.holder = holder;
        log::trace!("builder open, depth {}", self.depth());
        let cx = self.context.insert(context);

        match &mut self.assembly {
            Some(assembly) => assembly.on_create(cx),
            None => Err(ProtocolError::AlreadyClosed.into()),
        }
    }

    /// Begins a nested value.
    ///
    /// Returns the child builder, still unopened; pass it to
    /// [`descend`](Self::descend) to open it under `self`. `None` means the
    /// entry is unknown or cannot be built and should be skipped.
    pub fn on_open(
        &mut self,
        alias: Option<&str>,
        index: Option<usize>,
        space: Option<&str>,
    ) -> Result<Option<Builder>, CodecError> {
        self.ensure_open()?;
        let (cx, assembly) = self.parts()?;
        assembly.on_open(cx, alias, index, space)
    }

    /// Opens `child` with `self` as its parent and returns it.
    pub fn descend(self: Box<Self>, mut child: Builder) -> Result<Box<Builder>, CodecError> {
        self.ensure_open()?;
        let context = self.context.clone().ok_or(ProtocolError::NotOpen)?;
        child.init(Some(self), context)?;
        Ok(Box::new(child))
    }

    /// Applies a scalar entry.
    pub fn on_emit(
        &mut self,
        alias: Option<&str>,
        index: Option<usize>,
        token: Token<'_>,
    ) -> Result<(), CodecError> {
        self.ensure_open()?;
        let (cx, assembly) = self.parts()?;
        assembly.on_emit(cx, alias, index, token)
    }

    /// Receives the value of a child that closed.
    pub fn on_child_done(&mut self, value: Box<dyn Object>) -> Result<(), CodecError> {
        self.ensure_open()?;
        let (cx, assembly) = self.parts()?;
        assembly.on_child(cx, value)
    }

    /// Closes the builder.
    ///
    /// When `committed`, the value is built and handed to the parent.
    /// A failure there propagates if `strict`; otherwise it is logged, the
    /// value is dropped and the parent is still returned.
    pub fn close(mut self: Box<Self>, committed: bool, strict: bool) -> Result<Closed, CodecError> {
        self.ensure_open()?;
        self.state = State::Closed;

        let mut holder = self.holder.take();
        let context = self.context.take();
        let assembly = self.assembly.take();

        let outcome = match (committed, context, assembly) {
            (true, Some(cx), Some(assembly)) => assembly.build(&cx).and_then(|value| match holder.as_deref_mut() {
                Some(parent) => parent.on_child_done(value).map(|()| None),
                None => Ok(Some(value)),
            }),
            _ => Ok(None),
        };

        let value = match outcome {
            Ok(value) => value,
            Err(error) if !strict => {
                log::warn!("discarding a value that failed to finish: {error}");
                None
            }
            Err(error) => return Err(error),
        };

        log::trace!("builder closed, committed: {committed}");
        Ok(match holder {
            Some(holder) => Closed::Holder(holder),
            None => Closed::Root(value),
        })
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut holder = self.holder.as_deref();
        while let Some(parent) = holder {
            depth += 1;
            holder = parent.holder.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("state", &self.state)
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}
