//! Host fingerprints and engine action identifiers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Width in bytes of an [`ActionId`].
pub const ACTION_ID_LEN: usize = 32;

/// The host build's own content fingerprint for a compilation unit.
///
/// Opaque to the engine: it is read from the host's build identifier
/// (everything before the first `/`) or from the host's package listing, and
/// only ever hashed, never interpreted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    /// Wraps raw fingerprint bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Extracts the unit fingerprint from a slash-delimited build identifier.
    ///
    /// Returns `None` when there is no `/` or the leading segment is empty.
    pub fn from_build_id(build_id: &str) -> Option<Self> {
        let (head, _) = build_id.split_once('/')?;
        if head.is_empty() {
            return None;
        }
        Some(Self(head.as_bytes().to_vec()))
    }

    /// Returns the raw fingerprint bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

/// A fixed-width SHA-256 key identifying one engine action.
///
/// Action ids are never computed from source content directly; they are
/// derived by hashing a host [`Fingerprint`] together with namespace strings,
/// so distinct namespaces give disjoint key spaces.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId([u8; ACTION_ID_LEN]);

impl ActionId {
    /// Hashes the concatenation of `parts`.
    pub fn digest(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    /// Creates an id from raw bytes.
    pub fn from_raw(bytes: [u8; ACTION_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Parses the lowercase hex form produced by `Display`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut out = [0u8; ACTION_ID_LEN];
        hex::decode_to_slice(s, &mut out).ok()?;
        Some(Self(out))
    }

    /// Returns the raw id bytes.
    pub fn as_bytes(&self) -> &[u8; ACTION_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionId({}..)", hex::encode(&self.0[..4]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_from_build_id() {
        let fp = Fingerprint::from_build_id("abc123/def456").unwrap();
        assert_eq!(fp.as_bytes(), b"abc123");
    }

    #[test]
    fn fingerprint_from_build_id_keeps_only_first_segment() {
        let fp = Fingerprint::from_build_id("a/b/c").unwrap();
        assert_eq!(fp.to_string(), "a");
    }

    #[test]
    fn fingerprint_rejects_unslashed_or_empty() {
        assert!(Fingerprint::from_build_id("noslash").is_none());
        assert!(Fingerprint::from_build_id("/tail").is_none());
    }

    #[test]
    fn digest_is_deterministic() {
        let a = ActionId::digest(&[b"fp", b"/x"]);
        let b = ActionId::digest(&[b"fp", b"/x"]);
        assert_eq!(a, b);
    }

    #[test]
    fn digest_concatenates_parts() {
        let split = ActionId::digest(&[b"ab", b"cd"]);
        let whole = ActionId::digest(&[b"abcd"]);
        assert_eq!(split, whole);
    }

    #[test]
    fn hex_roundtrip() {
        let id = ActionId::digest(&[b"roundtrip"]);
        let s = id.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(ActionId::from_hex(&s), Some(id));
    }

    #[test]
    fn serde_roundtrip() {
        let id = ActionId::digest(&[b"serde"]);
        let json = serde_json::to_string(&id).unwrap();
        let back: ActionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
