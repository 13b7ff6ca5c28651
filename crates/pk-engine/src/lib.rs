//! # pk-engine
//!
//! The mutation layer an agent talks to. One [`MutationEngine`] manages one
//! project root and enforces the safety policy:
//!
//! - every path passes the containment check before anything touches disk
//! - edits to a file that looks locked are staged instead, never dropped
//! - deletions and renames are only *requested*: a markdown log is written
//!   for a human to act on, and the live tree is left alone
//! - moves execute immediately, refuse to overwrite, and are logged after
//!
//! Per-project behavior comes from a [`ProjectProfile`] passed in by value;
//! there is no per-project subclassing.

pub mod engine;
pub mod error;
pub mod listing;
pub mod outcome;
pub mod profile;

pub use engine::{EditMode, MutationEngine};
pub use error::EngineError;
pub use outcome::{CompletedMove, Created, EditOutcome, MarkedForDeletion, StagedRename};
pub use profile::{Extension, ProjectProfile};
