use core::mem;
use core::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError, TryLockError};

struct Entry<T> {
    locked: bool,
    value: Option<T>,
}

// -----------------------------------------------------------------------------
// Pool

/// A single-slot pool.
///
/// [`acquire`](Self::acquire) never waits: when the slot is taken it returns
/// `None` and the caller allocates a fresh value instead. The slot's value
/// comes back when the [`Pooled`] guard drops.
pub struct Pool<T> {
    entry: Mutex<Entry<T>>,
}

impl<T: Default> Pool<T> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            entry: Mutex::new(Entry {
                locked: false,
                value: None,
            }),
        }
    }

    /// Takes the pooled value, or `None` if it is in use.
    pub fn acquire(&self) -> Option<Pooled<'_, T>> {
        let mut entry = match self.entry.try_lock() {
            Ok(entry) => entry,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        if entry.locked {
            return None;
        }
        entry.locked = true;
        let value = entry.value.take().unwrap_or_default();
        drop(entry);

        Some(Pooled { pool: self, value })
    }

    /// Returns `true` while a [`Pooled`] guard is alive.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner).locked
    }
}

impl<T: Default> Default for Pool<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pool").finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Pooled

/// The value of a [`Pool`], returned to it on drop.
pub struct Pooled<'a, T: Default> {
    pool: &'a Pool<T>,
    value: T,
}

impl<T: Default> Deref for Pooled<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Default> DerefMut for Pooled<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        let value = mem::take(&mut self.value);
        let mut entry = self.pool.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry.value = Some(value);
        entry.locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::Pool;

    #[test]
    fn fail_fast() {
        let pool = Pool::<u32>::new();

        let mut first = pool.acquire().unwrap();
        *first = 7;
        assert!(pool.is_locked());
        assert!(pool.acquire().is_none());

        drop(first);
        assert!(!pool.is_locked());
        assert_eq!(*pool.acquire().unwrap(), 7);
    }
}
