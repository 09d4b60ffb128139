//! Side metadata stored next to each dimension artifact.

use serde::{Deserialize, Serialize};

/// What the link phase needs to know about a dimension build without
/// re-running its transformer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionMetadata {
    /// Packages the transformer declared as newly required, in sorted order.
    #[serde(default)]
    pub extra_dependency_packages: Vec<String>,
}
