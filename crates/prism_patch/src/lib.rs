//! Position-based source patching.
//!
//! A [`Patch`] replaces a [`Range`](prism_source::Range) of original source
//! text (or inserts at a point) with new text, optionally built from a
//! restricted template over captured ranges of the same file. [`apply_patches`]
//! validates an unordered patch set, rejects any overlap, and splices the
//! edits from the end of each file toward its start so earlier offsets stay
//! valid. Only files touched by at least one patch appear in the result.

#![warn(missing_docs)]

pub mod apply;
pub mod error;
pub mod patch;
pub mod template;

pub use apply::{apply_patches, PatchedFile};
pub use error::{PatchError, TemplateError};
pub use patch::Patch;
