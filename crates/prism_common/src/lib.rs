//! Shared foundational types used across the prism dimension build engine.
//!
//! This crate provides content hashing for cached payloads, the host-supplied
//! [`Fingerprint`] and engine-derived [`ActionId`] cache keys, and the
//! [`Outcome`] type that separates deferred work from success.

#![warn(missing_docs)]

pub mod action;
pub mod hash;
pub mod outcome;

pub use action::{ActionId, Fingerprint};
pub use hash::ContentHash;
pub use outcome::{Deferral, Outcome};
