use bitflags::bitflags;

bitflags! {
    /// Options carried by a builder [`Context`](crate::builder::Context) and
    /// by output sinks.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Retry unmatched names with the case and underscore folding hash.
        const FOLD_ALIAS   = 1 << 0;
        /// Surface finalization errors from `close` instead of dropping the value.
        const STRICT       = 1 << 1;
        /// Fail on names that match no property instead of skipping them.
        const DENY_UNKNOWN = 1 << 2;
        /// Omit null values even for nullable properties.
        const SKIP_NULL    = 1 << 3;
        /// Write the discriminator of every object value, not only of
        /// entries declared dynamic.
        const WRITE_SPACE  = 1 << 4;
    }
}
