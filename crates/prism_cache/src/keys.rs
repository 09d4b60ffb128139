//! Derivation of dimension action ids and their cache sub-keys.
//!
//! The byte layout of every hash input lives here and nowhere else.

use prism_common::{ActionId, Fingerprint};

const DIMENSION_NAMESPACE: &[u8] = b"/dimension/";
const ARTIFACT_NAMESPACE: &[u8] = b"/dimension/artifact";
const METADATA_NAMESPACE: &[u8] = b"/dimension/metadata";

/// Derives the action id of a unit compiled under `dimension`.
///
/// `sha256(fingerprint ‖ "/dimension/" ‖ dimension ‖ "/" ‖ version)`.
pub fn derive_action_id(fingerprint: &Fingerprint, dimension: &str, version: &str) -> ActionId {
    ActionId::digest(&[
        fingerprint.as_bytes(),
        DIMENSION_NAMESPACE,
        dimension.as_bytes(),
        b"/",
        version.as_bytes(),
    ])
}

/// Cache key of the compiled artifact for `id`.
pub fn artifact_key(id: &ActionId) -> ActionId {
    ActionId::digest(&[id.as_bytes(), ARTIFACT_NAMESPACE])
}

/// Cache key of the side metadata for `id`.
pub fn metadata_key(id: &ActionId) -> ActionId {
    ActionId::digest(&[id.as_bytes(), METADATA_NAMESPACE])
}

/// The build identifier handed to the host compiler for a dimension build.
///
/// Slash-delimited like the host's own, so the leading segment again reads
/// as the unit's fingerprint.
pub fn dimension_build_id(id: &ActionId) -> String {
    let bytes = id.as_bytes();
    format!("{}/{}", hex::encode(&bytes[..16]), hex::encode(&bytes[16..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::new(s.as_bytes())
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            derive_action_id(&fp("abc"), "trace", "1"),
            derive_action_id(&fp("abc"), "trace", "1")
        );
    }

    #[test]
    fn version_changes_id() {
        assert_ne!(
            derive_action_id(&fp("abc"), "trace", "1"),
            derive_action_id(&fp("abc"), "trace", "2")
        );
    }

    #[test]
    fn fingerprint_changes_id() {
        assert_ne!(
            derive_action_id(&fp("abc"), "trace", "1"),
            derive_action_id(&fp("abd"), "trace", "1")
        );
    }

    #[test]
    fn dimension_changes_id() {
        assert_ne!(
            derive_action_id(&fp("abc"), "trace", "1"),
            derive_action_id(&fp("abc"), "mock", "1")
        );
    }

    #[test]
    fn matches_documented_layout() {
        let id = derive_action_id(&fp("abc"), "trace", "v1");
        assert_eq!(id, ActionId::digest(&[b"abc/dimension/trace/v1"]));
    }

    #[test]
    fn sub_keys_are_disjoint() {
        let id = derive_action_id(&fp("abc"), "trace", "1");
        assert_ne!(artifact_key(&id), metadata_key(&id));
        assert_ne!(artifact_key(&id), id);
        assert_ne!(metadata_key(&id), id);
    }

    #[test]
    fn build_id_shape() {
        let id = derive_action_id(&fp("abc"), "trace", "1");
        let build_id = dimension_build_id(&id);
        let (head, tail) = build_id.split_once('/').unwrap();
        assert_eq!(head.len(), 32);
        assert_eq!(tail.len(), 32);
        assert_eq!(format!("{head}{tail}"), id.to_string());
        assert_eq!(
            Fingerprint::from_build_id(&build_id).unwrap().as_bytes(),
            head.as_bytes()
        );
    }
}
