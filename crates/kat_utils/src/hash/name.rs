//! Hashes used to key property names.
//!
//! [`name_hash`] hashes the literal bytes of a name.
//!
//! [`fold_hash`] hashes a name after removing single underscores and
//! lowering ASCII letters, so `user_name`, `userName` and `USERNAME`
//! collide on purpose. Names it cannot fold unambiguously (a leading,
//! trailing or doubled underscore) hash to `0`, which never matches.

use core::hash::{BuildHasher, Hasher};

use super::FixedHashState;

/// Primary hash of a property name.
///
/// Never returns `0`, leaving it free as the "no hash" sentinel.
#[inline]
pub fn name_hash(name: &str) -> u64 {
    match FixedHashState.hash_one(name) {
        0 => 1,
        h => h,
    }
}

/// Case and underscore folding hash of a property name, `0` for no match.
///
/// # Examples
///
/// ```
/// use kat_utils::hash::fold_hash;
///
/// assert_eq!(fold_hash("user_name"), fold_hash("userName"));
/// assert_eq!(fold_hash("_id"), 0);
/// assert_eq!(fold_hash("id_"), 0);
/// assert_eq!(fold_hash("a__b"), 0);
/// ```
pub fn fold_hash(name: &str) -> u64 {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes[0] == b'_' || bytes[bytes.len() - 1] == b'_' {
        return 0;
    }

    let mut hasher = FixedHashState.build_hasher();
    let mut last = 0_u8;
    for &b in bytes {
        if b == b'_' {
            if last == b'_' {
                return 0;
            }
        } else {
            hasher.write_u8(b.to_ascii_lowercase());
        }
        last = b;
    }

    match hasher.finish() {
        0 => 1,
        h => h,
    }
}

/// Returns `true` if two names are equal once folded.
///
/// Only meaningful for names whose [`fold_hash`] is not `0`.
pub fn fold_eq(a: &str, b: &str) -> bool {
    fn folded(name: &str) -> impl Iterator<Item = u8> + '_ {
        name.bytes().filter(|&b| b != b'_').map(|b| b.to_ascii_lowercase())
    }
    folded(a).eq(folded(b))
}

#[cfg(test)]
mod tests {
    use super::{fold_eq, fold_hash, name_hash};

    #[test]
    fn folded_equality() {
        assert!(fold_eq("user_name", "UserName"));
        assert!(!fold_eq("user_name", "user_names"));
    }

    #[test]
    fn primary_is_literal() {
        assert_eq!(name_hash("name"), name_hash("name"));
        assert_ne!(name_hash("name"), name_hash("Name"));
        assert_ne!(name_hash(""), 0);
    }

    #[test]
    fn folding() {
        assert_eq!(fold_hash("created_at"), fold_hash("createdAt"));
        assert_eq!(fold_hash("CREATED_AT"), fold_hash("createdat"));
        assert_ne!(fold_hash("created_at"), fold_hash("created"));
        assert_ne!(fold_hash("a"), 0);
    }

    #[test]
    fn folding_sentinel() {
        assert_eq!(fold_hash(""), 0);
        assert_eq!(fold_hash("_"), 0);
        assert_eq!(fold_hash("__init"), 0);
        assert_eq!(fold_hash("value_"), 0);
        assert_eq!(fold_hash("user__name"), 0);
    }
}
