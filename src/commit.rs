//! Commit records
//!
//! A commit is one authored edit: a delta plus the ancestry pointers that
//! say what the delta is relative to and what canonical head its author had
//! seen. The rebase engine rewrites these fields in place.
//!
//! Author: Moroya Sakamoto

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::changeset::ChangeSet;
use crate::delta::Delta;

/// Opaque, author-assigned commit identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self(String::from(id))
    }
}

impl From<String> for CommitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A commit in the branch history
#[derive(Debug, Clone, PartialEq)]
pub struct Commit<D: Delta = ChangeSet> {
    /// Unique identifier, never reused
    pub id: CommitId,
    /// Commit the delta is expressed relative to
    pub reference_id: CommitId,
    /// Canonical head the author had last observed
    pub remote_head_id: CommitId,
    /// Where the author's unsynchronized local branch diverged
    ///
    /// Only meaningful while `reference_id != remote_head_id`.
    pub local_branch_start_id: Option<CommitId>,
    /// The edit itself
    pub delta: D,
    /// Interleaving metadata from the most recent rebase
    pub rebase_metadata: D::Metadata,
    /// Conflicts from the most recent rebase
    ///
    /// After a reconciliation this also holds conflicts raised while
    /// re-rebasing landed commits of the author's local chain; their
    /// `incoming` op belongs to that earlier commit, not to this one.
    pub conflicts: Vec<D::Conflict>,
}

impl<D: Delta> Commit<D> {
    /// Commit authored directly on top of `reference_id`
    pub fn new(id: impl Into<CommitId>, reference_id: impl Into<CommitId>, delta: D) -> Self {
        let reference_id = reference_id.into();
        Self {
            id: id.into(),
            remote_head_id: reference_id.clone(),
            reference_id,
            local_branch_start_id: None,
            delta,
            rebase_metadata: D::Metadata::default(),
            conflicts: Vec::new(),
        }
    }

    /// Root commit: references itself and changes nothing
    pub fn root(id: impl Into<CommitId>) -> Self {
        let id = id.into();
        Self::new(id.clone(), id, D::default())
    }

    /// Set the canonical head the author had observed
    pub fn with_remote_head(mut self, remote_head_id: impl Into<CommitId>) -> Self {
        self.remote_head_id = remote_head_id.into();
        self
    }

    /// Set where the author's local branch diverged
    pub fn with_local_branch_start(mut self, start: impl Into<CommitId>) -> Self {
        self.local_branch_start_id = Some(start.into());
        self
    }

    /// True if the delta is expressed relative to canonical history
    pub fn is_canonical_relative(&self) -> bool {
        self.reference_id == self.remote_head_id
    }

    pub fn is_root(&self) -> bool {
        self.reference_id == self.id
    }

    /// Point both ancestry references at `head`
    pub(crate) fn repoint(&mut self, head: &CommitId) {
        self.reference_id = head.clone();
        self.remote_head_id = head.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_commit_is_canonical_relative() {
        let commit: Commit = Commit::new("c1", "root", ChangeSet::new().with_insert("a", 1i64));
        assert!(commit.is_canonical_relative());
        assert_eq!(commit.remote_head_id, CommitId::from("root"));
        assert!(commit.local_branch_start_id.is_none());
        assert!(commit.conflicts.is_empty());
    }

    #[test]
    fn test_root_references_itself() {
        let root: Commit = Commit::root("r");
        assert!(root.is_root());
        assert!(root.is_canonical_relative());
        assert!(root.delta.is_empty());
    }

    #[test]
    fn test_builder_sets_branch_pointers() {
        let commit: Commit = Commit::new("c3", "c2", ChangeSet::new())
            .with_remote_head("c0")
            .with_local_branch_start("c1");
        assert!(!commit.is_canonical_relative());
        assert_eq!(commit.local_branch_start_id, Some(CommitId::from("c1")));
    }

    #[test]
    fn test_repoint_moves_both_references() {
        let mut commit: Commit = Commit::new("c3", "c2", ChangeSet::new()).with_remote_head("c0");
        commit.repoint(&CommitId::from("c9"));
        assert_eq!(commit.reference_id, CommitId::from("c9"));
        assert!(commit.is_canonical_relative());
    }

    #[test]
    fn test_commit_id_display_and_serde() {
        let id = CommitId::new("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
