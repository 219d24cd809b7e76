//! ALICE-Rebase: Branch Reconciliation for Collaborative Trees
//!
//! Edits arrive late. Rebase them onto what already landed.
//!
//! Rebases a commit, authored against a stale view of a shared property
//! tree, onto the branch's current canonical head:
//! - Reversible change sets that compose, invert and rebase
//! - Rebuilds the author's unsynchronized local chain before rebasing
//! - Local commits that already landed are substituted, never applied twice
//! - Conflicts are returned as data, never as errors
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value`] | Property values and path helpers |
//! | [`document`] | Flat property tree a change set applies to |
//! | [`changeset`] | Reversible change sets: compose, invert, rebase, diff |
//! | [`conflict`] | Conflict descriptors produced by rebasing |
//! | [`delta`] | The delta contract the rebase engine is written against |
//! | [`commit`] | Commit records and identifiers |
//! | [`history`] | History lookup trait and the in-memory branch |
//! | [`rebase`] | The reconciliation engine |
//! | [`config`] | Engine configuration (TOML) |
//! | [`error`] | Error types |
//!
//! # Quick Start
//!
//! ```
//! use alice_rebase::{BranchHistory, ChangeSet, Commit, ConflictKind};
//!
//! let mut branch = BranchHistory::new("root");
//! branch
//!     .commit(Commit::new("c1", "root", ChangeSet::new().with_insert("a", "Hello")), false)
//!     .unwrap();
//! branch
//!     .commit(Commit::new("c2", "c1", ChangeSet::new().with_remove("a", "Hello")), false)
//!     .unwrap();
//!
//! // Authored against c1, after c2 removed the property
//! let late = Commit::new("c3", "c1", ChangeSet::new().with_modify("a", "Hello", "Bye"));
//! let c3 = branch.commit(late, true).unwrap();
//!
//! assert!(c3.delta.is_empty());
//! assert_eq!(c3.conflicts[0].kind, ConflictKind::EntryModifiedAfterRemove);
//! assert_eq!(c3.reference_id.as_str(), "c2");
//! ```
//!
//! Author: Moroya Sakamoto

pub mod changeset;
pub mod commit;
pub mod config;
pub mod conflict;
pub mod delta;
pub mod document;
pub mod error;
pub mod history;
pub mod rebase;
pub mod value;

pub use changeset::{AfterMetadata, ChangeSet, OpKind, PropertyOp};
pub use commit::{Commit, CommitId};
pub use config::RebaseConfig;
pub use conflict::{Conflict, ConflictKind};
pub use delta::Delta;
pub use document::Document;
pub use error::{ApplyError, ConfigError, HistoryError, RebaseError};
pub use history::{BranchHistory, History};
pub use rebase::{rebase_chain, Fold, Rebaser, Reconciled};
pub use value::{Path, PropertyValue};
