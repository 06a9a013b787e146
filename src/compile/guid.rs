//! GUID derivation (§4.7): SHA-1 of an accumulated fingerprint string,
//! treated as an opaque 16-byte identifier rather than a valid RFC 4122
//! UUID.

use sha1::{Digest, Sha1};

/// Accumulates `"&"`-joined fragments the way the builder's `append_guid`
/// does, and hashes the result. `namespace` is always the zero UUID for
/// this format — the source hashes under a zeroed namespace rather than a
/// real one.
#[derive(Debug, Default, Clone)]
pub struct GuidAccumulator {
    fingerprint: String,
}

impl GuidAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `s`, joined with `&` unless the accumulator is still empty.
    pub fn append(&mut self, s: &str) {
        if self.fingerprint.is_empty() {
            self.fingerprint.push_str(s);
        } else {
            self.fingerprint.push('&');
            self.fingerprint.push_str(s);
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Hashes the accumulated fingerprint into a 16-byte GUID. Returns all
    /// zeros if nothing has been appended (§4.5 step 8).
    pub fn finish(&self) -> [u8; 16] {
        if self.fingerprint.is_empty() {
            return [0u8; 16];
        }
        hash_fingerprint(&self.fingerprint)
    }
}

/// SHA-1 of a zeroed 16-byte namespace prefix followed by `fingerprint`'s
/// UTF-8 bytes, truncated to 16 bytes — the "name-based UUID" construction
/// from RFC 4122 §4.3, minus the version/variant bit fixup that construction
/// normally performs.
fn hash_fingerprint(fingerprint: &str) -> [u8; 16] {
    let namespace = [0u8; 16];
    let mut hasher = Sha1::new();
    hasher.update(namespace);
    hasher.update(fingerprint.as_bytes());
    let digest = hasher.finalize();
    let mut guid = [0u8; 16];
    guid.copy_from_slice(&digest[..16]);
    guid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_with_ampersand_separator() {
        let mut acc = GuidAccumulator::new();
        acc.append("a");
        acc.append("b");
        assert_eq!(acc.fingerprint(), "a&b");
    }

    #[test]
    fn first_append_has_no_leading_separator() {
        let mut acc = GuidAccumulator::new();
        acc.append("only");
        assert_eq!(acc.fingerprint(), "only");
    }

    #[test]
    fn empty_fingerprint_hashes_to_all_zero() {
        let acc = GuidAccumulator::new();
        assert_eq!(acc.finish(), [0u8; 16]);
    }

    #[test]
    fn is_deterministic_for_a_fixed_sequence() {
        let mut a = GuidAccumulator::new();
        a.append("x");
        a.append("y");
        let mut b = GuidAccumulator::new();
        b.append("x");
        b.append("y");
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn matches_manual_sha1_of_namespace_plus_fingerprint() {
        let mut acc = GuidAccumulator::new();
        acc.append("a");
        acc.append("b");
        let expected = hash_fingerprint("a&b");
        assert_eq!(acc.finish(), expected);
    }
}
