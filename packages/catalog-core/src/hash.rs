//! FNV-1a hash utilities for filter fingerprints.
//!
//! Stores tag the cursor tokens they issue with a fingerprint of the filter
//! the token was produced under, so a token replayed against a different
//! filter can be rejected. The hash only needs to be stable across runs of
//! the same build; it is not a security boundary.

/// FNV-1a offset basis (64-bit).
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a prime (64-bit).
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Computes a 64-bit FNV-1a hash over the UTF-8 bytes of `s`.
///
/// # Examples
///
/// ```
/// use catalog_core::hash::fnv1a_hash;
///
/// assert_eq!(fnv1a_hash(""), 0xcbf2_9ce4_8422_2325); // offset basis
/// assert_ne!(fnv1a_hash("arrays"), fnv1a_hash("graphs"));
/// ```
#[must_use]
pub fn fnv1a_hash(s: &str) -> u64 {
    fnv1a_extend(FNV_OFFSET_BASIS, s)
}

/// Continues an FNV-1a hash with more input.
#[must_use]
pub fn fnv1a_extend(mut hash: u64, s: &str) -> u64 {
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hashes a sequence of optional fields into one order-dependent value.
///
/// `None` and `Some("")` hash differently, and field boundaries are marked so
/// that `["ab", "c"]` and `["a", "bc"]` do not collide.
#[must_use]
pub fn hash_fields(fields: &[Option<&str>]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for field in fields {
        hash = match field {
            Some(value) => fnv1a_extend(fnv1a_extend(hash, "\u{1}"), value),
            None => fnv1a_extend(hash, "\u{0}"),
        };
        hash = fnv1a_extend(hash, "\u{1f}");
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_offset_basis() {
        assert_eq!(fnv1a_hash(""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn known_vector() {
        // Published FNV-1a 64-bit test vector.
        assert_eq!(fnv1a_hash("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn extend_matches_concatenation() {
        assert_eq!(fnv1a_extend(fnv1a_hash("foo"), "bar"), fnv1a_hash("foobar"));
    }

    #[test]
    fn field_boundaries_are_significant() {
        assert_ne!(
            hash_fields(&[Some("ab"), Some("c")]),
            hash_fields(&[Some("a"), Some("bc")])
        );
        assert_ne!(hash_fields(&[None]), hash_fields(&[Some("")]));
        assert_eq!(
            hash_fields(&[Some("x"), None]),
            hash_fields(&[Some("x"), None])
        );
    }
}
