//! Error types
//!
//! Conflicts are not errors: they are returned as data alongside a
//! successful rebase. Everything here aborts the operation that raised it.
//!
//! Author: Moroya Sakamoto

use thiserror::Error;

use crate::commit::CommitId;
use crate::value::Path;

/// Errors that abort a reconciliation.
#[derive(Debug, Error)]
pub enum RebaseError {
    /// An ancestry pointer does not resolve via history lookup
    #[error("commit {commit} references unknown commit {missing}")]
    BrokenHistory { commit: CommitId, missing: CommitId },

    /// The commit diverges from canonical history but names no branch start
    #[error("commit {0} diverges from its remote head but has no local branch start")]
    MissingBranchStart(CommitId),

    /// An ancestry walk did not terminate within the configured depth
    #[error("ancestry walk from commit {commit} exceeded {limit} commits")]
    AncestryTooDeep { commit: CommitId, limit: usize },

    /// A rebased local commit differs from its canonical counterpart
    #[error("rebased commit {0} does not match its canonical counterpart")]
    InterleavingMismatch(CommitId),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Errors raised by a history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("unknown commit {0}")]
    UnknownCommit(CommitId),

    #[error("commit {0} already exists")]
    DuplicateCommit(CommitId),

    /// A non-rebasing commit was authored against an outdated head
    #[error("commit {commit} references {reference} but the branch head is {head}")]
    StaleReference {
        commit: CommitId,
        reference: CommitId,
        head: CommitId,
    },

    /// The backing store could not answer (I/O failure, cancellation)
    #[error("history unavailable: {0}")]
    Unavailable(String),
}

/// Precondition failures when applying a change set to a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("cannot insert {0}: property already exists")]
    AlreadyExists(Path),

    #[error("property {0} does not exist")]
    Missing(Path),

    /// The recorded old value does not match the document
    #[error("property {path} holds {actual}, change expected {expected}")]
    StaleValue {
        path: Path,
        expected: String,
        actual: String,
    },
}

/// Configuration load/store failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse rebase config")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize rebase config")]
    Serialize(#[from] toml::ser::Error),
}
