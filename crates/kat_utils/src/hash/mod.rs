//! Provide hash states, name hashing, re-exports *hashbrown* and *foldhash*.

// -----------------------------------------------------------------------------
// Modules

mod hasher;
mod name;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, NoOpHashState, NoOpHasher};

pub use name::{fold_eq, fold_hash, name_hash};

/// A [`hashbrown::HashMap`] with the fixed-seed [`FixedHashState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
