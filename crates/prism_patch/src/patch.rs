//! The patch type and constructors used by transformers.

use std::collections::BTreeMap;

use prism_source::{Pos, Range};
use serde::{Deserialize, Serialize};

/// Capture name used by [`Patch::wrap`].
pub const WRAPPED_CAPTURE: &str = "wrapped";

/// A positional edit to one source file.
///
/// The file is implied by `range.start`. When `text` contains template
/// markup, each `{{.name}}` is replaced by the original source text covered by
/// `captures[name]`, which must lie in the same file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// The replaced range, or a point for an insertion.
    pub range: Range,
    /// Named ranges of original text available to the template.
    #[serde(default)]
    pub captures: BTreeMap<String, Range>,
    /// Replacement text, possibly a template.
    pub text: String,
}

impl Patch {
    /// Replaces `range` with `text`.
    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range,
            captures: BTreeMap::new(),
            text: text.into(),
        }
    }

    /// Inserts `text` at `pos`.
    pub fn insert(pos: Pos, text: impl Into<String>) -> Self {
        Self::replace(Range::point(pos), text)
    }

    /// Surrounds the text of `range` with `lhs` and `rhs`.
    pub fn wrap(range: Range, lhs: &str, rhs: &str) -> Self {
        Self::replace(range, format!("{lhs}{{{{.{WRAPPED_CAPTURE}}}}}{rhs}"))
            .with_capture(WRAPPED_CAPTURE, range)
    }

    /// Adds a named capture.
    pub fn with_capture(mut self, name: impl Into<String>, range: Range) -> Self {
        self.captures.insert(name.into(), range);
        self
    }
}
