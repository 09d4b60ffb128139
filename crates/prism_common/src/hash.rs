//! XXH3 digests of payload bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The 128-bit XXH3 digest of a byte string.
///
/// Cached payloads live in files named after their digest, and the digest
/// is checked again whenever a payload is read back. The engine's
/// executable id is the digest of its own binary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Digest of `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Digest bytes, little-endian.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_digest() {
        let object = b"go object archive\n";
        assert_eq!(ContentHash::from_bytes(object), ContentHash::from_bytes(object));
        assert_ne!(
            ContentHash::from_bytes(b"trace variant"),
            ContentHash::from_bytes(b"trace variant ")
        );
    }

    #[test]
    fn names_are_32_hex_digits() {
        let name = ContentHash::from_bytes(b"").to_string();
        assert_eq!(name.len(), 32);
        assert!(name.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    }

    #[test]
    fn bytes_match_display() {
        let h = ContentHash::from_bytes(b"payload");
        assert_eq!(hex::encode(h.as_bytes()), h.to_string());
        assert_eq!(format!("{h:?}"), format!("ContentHash({h})"));
    }

    #[test]
    fn survives_json() {
        let h = ContentHash::from_bytes(b"metadata");
        let back: ContentHash = serde_json::from_str(&serde_json::to_string(&h).unwrap()).unwrap();
        assert_eq!(h, back);
    }
}
