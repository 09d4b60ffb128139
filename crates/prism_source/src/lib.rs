//! Source file management and position tracking for compilation units.
//!
//! This crate provides the [`SourceDb`], which owns the original text of every
//! file in a compilation unit and assigns each file a disjoint window of global
//! [`Pos`] values. A [`Range`] of positions therefore identifies its file on
//! its own, which is what lets patches be handed around without file names.
//! File-local byte ranges are tracked with [`Span`] and converted to ranges
//! through the owning [`SourceFile`].

#![warn(missing_docs)]

pub mod file_id;
pub mod pos;
pub mod range;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use file_id::FileId;
pub use pos::{Pos, Position};
pub use range::Range;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::Span;
