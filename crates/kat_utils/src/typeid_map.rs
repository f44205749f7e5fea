use core::any::TypeId;
use core::fmt::Debug;

use crate::hash::NoOpHashState;
use crate::hash::hashbrown::HashMap;
use crate::hash::hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`], holding per-type codecs, schema failures and
/// type infos.
///
/// `TypeId` is already a well distributed hash, so the map skips hashing
/// through [`NoOpHashState`].
pub struct TypeIdMap<V>(HashMap<TypeId, V, NoOpHashState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty map, usable in a `static`.
    ///
    /// ```
    /// use kat_utils::TypeIdMap;
    /// let map = TypeIdMap::<i32>::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(NoOpHashState))
    }

    /// The value of an existing key, or `f()` inserted for a vacant one.
    ///
    /// Two threads racing on a vacant key both run `f`, only the first
    /// result is kept.
    #[inline]
    pub fn get_or_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> &mut V {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => entry.insert(f()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    /// Inserts a value, returning the one it replaced.
    #[inline]
    pub fn insert(&mut self, type_id: TypeId, v: V) -> Option<V> {
        self.0.insert(type_id, v)
    }

    #[inline]
    pub fn remove(&mut self, type_id: &TypeId) -> Option<V> {
        self.0.remove(type_id)
    }

    /// Removes the key only if `pred` accepts its current value.
    pub fn remove_if(&mut self, type_id: &TypeId, pred: impl FnOnce(&V) -> bool) -> Option<V> {
        match self.0.entry(*type_id) {
            Entry::Occupied(entry) if pred(entry.get()) => Some(entry.remove()),
            _ => None,
        }
    }

    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains_key(type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for TypeIdMap<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for TypeIdMap<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::TypeIdMap;

    #[test]
    fn remove_if() {
        let mut map = TypeIdMap::new();
        map.insert(TypeId::of::<u8>(), 1);

        assert_eq!(map.remove_if(&TypeId::of::<u8>(), |v| *v == 2), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.remove_if(&TypeId::of::<u8>(), |v| *v == 1), Some(1));
        assert!(map.is_empty());
    }

    #[test]
    fn first_insert_wins() {
        let mut map = TypeIdMap::new();
        assert_eq!(*map.get_or_insert(TypeId::of::<str>(), || "first"), "first");
        assert_eq!(*map.get_or_insert(TypeId::of::<str>(), || "second"), "first");
        assert!(map.contains(&TypeId::of::<str>()));
        assert_eq!(map.get(&TypeId::of::<u8>()), None);
    }
}
