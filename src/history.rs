//! Branch history
//!
//! [`History`] is the read interface the rebase engine walks: commits as
//! their authors submitted them, and ranges of canonical (already rebased)
//! commits. [`BranchHistory`] is an in-memory branch that implements it and
//! accepts new commits, rebasing them onto its head on request.
//!
//! Author: Moroya Sakamoto

use core::future::{ready, Future};
use std::collections::HashMap;

use crate::changeset::ChangeSet;
use crate::commit::{Commit, CommitId};
use crate::config::RebaseConfig;
use crate::delta::Delta;
use crate::document::Document;
use crate::error::{ApplyError, HistoryError, RebaseError};
use crate::rebase::Rebaser;

/// Read access to a branch's commits
///
/// Both lookups return futures: an in-memory store answers immediately,
/// a remote store may suspend. The engine treats both the same way.
pub trait History<D: Delta = ChangeSet> {
    /// The commit as its author submitted it, before any rebase
    fn resolve_commit(
        &self,
        id: &CommitId,
    ) -> impl Future<Output = Result<Option<Commit<D>>, HistoryError>>;

    /// Canonical commits after `from`, up to and including `to`
    ///
    /// `to = None` means up to the current canonical head. Commits come in
    /// application order.
    fn canonical_range(
        &self,
        from: &CommitId,
        to: Option<&CommitId>,
    ) -> impl Future<Output = Result<Vec<Commit<D>>, HistoryError>>;
}

/// In-memory branch: submitted commits plus the canonical sequence
pub struct BranchHistory<D: Delta = ChangeSet> {
    /// Commits as submitted, indexed by id
    submitted: HashMap<CommitId, Commit<D>>,
    /// Rebased commits in application order; index 0 is the root
    canonical: Vec<Commit<D>>,
    /// Canonical position by id
    positions: HashMap<CommitId, usize>,
    config: RebaseConfig,
}

impl<D: Delta> BranchHistory<D> {
    /// Branch containing only the root commit
    pub fn new(root: impl Into<CommitId>) -> Self {
        Self::with_config(root, RebaseConfig::default())
    }

    pub fn with_config(root: impl Into<CommitId>, config: RebaseConfig) -> Self {
        let root = Commit::root(root);
        let mut submitted = HashMap::new();
        submitted.insert(root.id.clone(), root.clone());
        let mut positions = HashMap::new();
        positions.insert(root.id.clone(), 0);
        Self {
            submitted,
            canonical: vec![root],
            positions,
            config,
        }
    }

    /// Add a commit to the branch
    ///
    /// Without `rebase` the commit must reference the current head. With
    /// `rebase` it is reconciled against everything that landed since its
    /// author's reference point; the rebased local chain replaces the
    /// submitted copies it was computed from.
    pub fn commit(&mut self, commit: Commit<D>, rebase: bool) -> Result<&Commit<D>, RebaseError> {
        if self.submitted.contains_key(&commit.id) {
            return Err(HistoryError::DuplicateCommit(commit.id).into());
        }

        let mut rebased = commit.clone();
        if rebase {
            let outcome = Rebaser::with_config(&*self, self.config.clone())
                .reconcile_blocking(&mut rebased)?;
            for entry in outcome.local_chain {
                self.submitted.insert(entry.id.clone(), entry);
            }
        } else if commit.reference_id != *self.head_id() {
            return Err(HistoryError::StaleReference {
                commit: commit.id,
                reference: commit.reference_id,
                head: self.head_id().clone(),
            }
            .into());
        }

        tracing::debug!(commit = %rebased.id, rebase, "commit accepted");
        self.submitted.insert(commit.id.clone(), commit);
        self.positions
            .insert(rebased.id.clone(), self.canonical.len());
        self.canonical.push(rebased);
        Ok(self.head())
    }

    /// Current canonical head
    pub fn head(&self) -> &Commit<D> {
        // `canonical` always holds at least the root
        &self.canonical[self.canonical.len() - 1]
    }

    pub fn head_id(&self) -> &CommitId {
        &self.head().id
    }

    pub fn root_id(&self) -> &CommitId {
        &self.canonical[0].id
    }

    /// Canonical (rebased) version of a commit
    pub fn get_canonical(&self, id: &CommitId) -> Option<&Commit<D>> {
        self.positions.get(id).map(|&pos| &self.canonical[pos])
    }

    /// Commit as submitted
    pub fn get_submitted(&self, id: &CommitId) -> Option<&Commit<D>> {
        self.submitted.get(id)
    }

    /// All canonical commits, root first
    pub fn canonical_commits(&self) -> &[Commit<D>] {
        &self.canonical
    }

    /// Number of canonical commits, root included
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// True if only the root is present
    pub fn is_empty(&self) -> bool {
        self.canonical.len() == 1
    }

    pub fn config(&self) -> &RebaseConfig {
        &self.config
    }

    fn position(&self, id: &CommitId) -> Result<usize, HistoryError> {
        self.positions
            .get(id)
            .copied()
            .ok_or_else(|| HistoryError::UnknownCommit(id.clone()))
    }

    fn range(&self, from: &CommitId, to: Option<&CommitId>) -> Result<Vec<Commit<D>>, HistoryError> {
        let start = self.position(from)?;
        let end = match to {
            Some(id) => self.position(id)?,
            None => self.canonical.len() - 1,
        };
        if end <= start {
            return Ok(Vec::new());
        }
        Ok(self.canonical[start + 1..=end].to_vec())
    }
}

impl BranchHistory<ChangeSet> {
    /// Document state at the canonical head
    pub fn materialize(&self) -> Result<Document, ApplyError> {
        let mut doc = Document::new();
        for commit in &self.canonical {
            doc.apply(&commit.delta)?;
        }
        Ok(doc)
    }
}

impl<D: Delta> History<D> for BranchHistory<D> {
    fn resolve_commit(
        &self,
        id: &CommitId,
    ) -> impl Future<Output = Result<Option<Commit<D>>, HistoryError>> {
        ready(Ok(self.submitted.get(id).cloned()))
    }

    fn canonical_range(
        &self,
        from: &CommitId,
        to: Option<&CommitId>,
    ) -> impl Future<Output = Result<Vec<Commit<D>>, HistoryError>> {
        ready(self.range(from, to))
    }
}
