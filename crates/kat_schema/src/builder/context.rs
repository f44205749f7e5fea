use alloc::sync::Arc;

use crate::Flags;
use crate::registry::Registry;

/// Ambient state shared by every builder of one parse.
///
/// A child builder captures a clone of its parent's context in
/// [`Builder::init`](crate::builder::Builder::init).
#[derive(Clone, Debug)]
pub struct Context {
    registry: Arc<Registry>,
    flags: Flags,
}

impl Context {
    #[inline]
    pub fn new(registry: Arc<Registry>, flags: Flags) -> Self {
        Self { registry, flags }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[inline]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.flags.contains(Flags::STRICT)
    }
}
