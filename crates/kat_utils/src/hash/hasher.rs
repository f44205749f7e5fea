//! The two hash states of the workspace.
//!
//! Names are hashed with a seeded `foldhash` whose seed never changes, so a
//! property table lays out the same way in every process. `TypeId`s carry
//! their own hash and pass through untouched.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

const SEED: u64 = 0x6B61_7453_6368_656D;

// -----------------------------------------------------------------------------
// FixedHashState

/// Seeded `foldhash`, stable across processes.
///
/// ```
/// use core::hash::BuildHasher;
/// use kat_utils::hash::FixedHashState;
///
/// assert_eq!(FixedHashState.hash_one("id"), FixedHashState.hash_one("id"));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        const STATE: FixedState = FixedState::with_seed(SEED);
        STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHashState

/// Keeps the last `u64` written.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher(u64);

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    // Only reached by keys that do not hash as a single `u64`.
    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes.iter().fold(self.0, |h, &b| h.rotate_left(8) ^ u64::from(b));
    }
}

/// For keys whose `Hash` already writes a uniform `u64`, such as `TypeId`.
///
/// ```
/// use core::any::TypeId;
/// use core::hash::BuildHasher;
/// use kat_utils::hash::NoOpHashState;
///
/// let a = NoOpHashState.hash_one(TypeId::of::<u8>());
/// assert_eq!(a, NoOpHashState.hash_one(TypeId::of::<u8>()));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher(0)
    }
}

#[cfg(test)]
mod tests {
    use core::hash::{BuildHasher, Hash, Hasher};

    use super::{FixedHashState, NoOpHashState};

    #[test]
    fn u64_passes_through() {
        let mut hasher = NoOpHashState.build_hasher();
        7_u64.hash(&mut hasher);
        assert_eq!(hasher.finish(), 7);
    }

    #[test]
    fn seeded() {
        assert_ne!(FixedHashState.hash_one("a"), FixedHashState.hash_one("b"));
    }
}
