use alloc::sync::Arc;
use std::sync::OnceLock;

use crate::codec::Codec;
use crate::error::ResolutionError;
use crate::info::TypeInfo;
use crate::registry::Registry;

/// The codec of an accessor's declared type.
///
/// An explicit codec always wins. Otherwise the registry is asked on first
/// use and a successful answer is kept; failures are not cached.
pub struct ElementCodec {
    explicit: Option<Arc<dyn Codec>>,
    resolved: OnceLock<Arc<dyn Codec>>,
}

impl ElementCodec {
    #[inline]
    pub const fn new(explicit: Option<Arc<dyn Codec>>) -> Self {
        Self {
            explicit,
            resolved: OnceLock::new(),
        }
    }

    /// The explicit override.
    #[inline]
    pub fn explicit(&self) -> Option<&Arc<dyn Codec>> {
        self.explicit.as_ref()
    }

    /// The codec, if explicit or already resolved.
    #[inline]
    pub fn get(&self) -> Option<&Arc<dyn Codec>> {
        self.explicit.as_ref().or_else(|| self.resolved.get())
    }

    /// Returns the codec, resolving `info` through `registry` if needed.
    pub fn resolve(&self, registry: &Registry, info: &'static TypeInfo) -> Result<&Arc<dyn Codec>, ResolutionError> {
        if let Some(codec) = self.get() {
            return Ok(codec);
        }
        let codec = registry.try_resolve(info)?;
        Ok(self.resolved.get_or_init(|| codec))
    }
}

impl core::fmt::Debug for ElementCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElementCodec")
            .field("explicit", &self.explicit.is_some())
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}
