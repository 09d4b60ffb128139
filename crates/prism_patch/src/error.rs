//! Error types for patch validation and application.

/// Errors raised while validating or applying a patch set.
///
/// All of these are structural: a patch set that triggers one is rejected as
/// a whole and no output is produced.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// A patch has no valid start position.
    #[error("patch #{index} has no start position")]
    MissingStart {
        /// Index of the patch in the caller's list.
        index: usize,
    },

    /// A position does not belong to any file of the unit.
    #[error("patch #{index} references position {pos} outside every source file")]
    UnknownPosition {
        /// Index of the patch in the caller's list.
        index: usize,
        /// The raw position value.
        pos: u32,
    },

    /// A patch ends before it starts.
    #[error("patch at {location} ends before it starts")]
    EndBeforeStart {
        /// `path:line:col` of the patch start.
        location: String,
    },

    /// A patch or capture range spans more than one file.
    #[error("{what} at {location} does not end in the file it starts in")]
    CrossFile {
        /// What was being checked ("patch" or "capture `name`").
        what: String,
        /// `path:line:col` of the range start.
        location: String,
    },

    /// Two patches touch the same source text.
    #[error("patches overlap at {first} and {second}")]
    Overlap {
        /// `path:line:col` of the earlier patch.
        first: String,
        /// `path:line:col` of the later patch.
        second: String,
    },

    /// A capture range is invalid (missing end or outside the patched file).
    #[error("invalid capture `{name}` for patch at {location}: {reason}")]
    InvalidCapture {
        /// Capture name.
        name: String,
        /// `path:line:col` of the patch start.
        location: String,
        /// What is wrong with the capture.
        reason: String,
    },

    /// The patch text could not be rendered as a template.
    #[error("template for patch at {location}: {source}")]
    Template {
        /// `path:line:col` of the patch start.
        location: String,
        /// The underlying template error.
        source: TemplateError,
    },
}

/// Errors raised while rendering a patch template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `{{` without a matching `}}`.
    #[error("unterminated tag at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening braces.
        offset: usize,
    },

    /// A tag that is not of the form `{{.name}}`.
    #[error("unsupported tag `{{{{{tag}}}}}`, only `{{{{.name}}}}` is allowed")]
    InvalidTag {
        /// The tag body.
        tag: String,
    },

    /// A tag naming a capture that was not provided.
    #[error("unknown capture `{name}`")]
    UnknownCapture {
        /// The capture name.
        name: String,
    },
}
