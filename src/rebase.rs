//! Branch reconciliation
//!
//! Rebases an incoming commit, authored against whatever its author last
//! saw, onto the current canonical head. The author may still have had
//! unsynchronized local commits underneath it; some of those may meanwhile
//! have become canonical under their own ids. Both cases are handled:
//!
//! 1. The author's local chain is rebuilt relative to the remote head the
//!    author had seen, substituting any ancestors that were already
//!    canonical (never applying their effect twice).
//! 2. Canonical commits that landed after that remote head are folded into
//!    a single base delta, again substituting local-chain commits that
//!    turned up canonical.
//! 3. The incoming delta is rebased over that base.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeSet;

use crate::commit::{Commit, CommitId};
use crate::config::RebaseConfig;
use crate::delta::Delta;
use crate::error::RebaseError;
use crate::history::History;

/// Result of a successful reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<D: Delta> {
    /// Canonical head the incoming delta is now relative to
    pub head: CommitId,
    /// The author's local chain, rebased onto the remote head they had
    /// seen, oldest first. Empty if the incoming commit had not diverged.
    pub local_chain: Vec<Commit<D>>,
}

/// How one canonical commit enters a folded base
#[derive(Debug, Clone, PartialEq)]
pub enum Fold<'a, D: Delta> {
    /// The canonical commit is the confirmed counterpart of the chain head.
    /// `based` is the inverted chain-head delta with the running base
    /// applied; `delta` is the chain-head delta rebased over the running
    /// base, to be applied with `metadata`.
    Substituted {
        based: D,
        delta: D,
        metadata: D::Metadata,
    },
    /// Unrelated canonical commit, applied as is
    Verbatim(&'a D),
}

impl<'a, D: Delta> Fold<'a, D> {
    /// Decide how `canonical` folds onto `base`
    ///
    /// Conflicts from rebasing a substituted chain head go to `conflicts`.
    pub fn classify(
        base: &D,
        canonical: &'a Commit<D>,
        chain_head: Option<&Commit<D>>,
        conflicts: &mut Vec<D::Conflict>,
    ) -> Self {
        match chain_head {
            Some(head) if head.id == canonical.id => {
                let mut based = head.delta.clone();
                based.invert();
                based.apply(base, None);

                let mut delta = head.delta.clone();
                let mut metadata = D::Metadata::default();
                base.rebase(&mut delta, conflicts, &mut metadata);
                Fold::Substituted {
                    based,
                    delta,
                    metadata,
                }
            }
            _ => Fold::Verbatim(&canonical.delta),
        }
    }
}

/// Rebase `chain` over `base`, one commit after the other
///
/// Each entry ends up relative to the previous entry's rebased state; its
/// conflicts and interleaving metadata are replaced. Returns the base that
/// carries the whole chain's effect, for whatever follows the chain.
pub fn rebase_chain<D: Delta>(base: D, chain: &mut [Commit<D>]) -> D {
    let mut running = base;
    for commit in chain.iter_mut() {
        let mut next = commit.delta.clone();
        next.invert();

        let mut conflicts = Vec::new();
        let mut metadata = D::Metadata::default();
        running.rebase(&mut commit.delta, &mut conflicts, &mut metadata);

        next.apply(&running, None);
        next.apply(&commit.delta, Some(&metadata));

        commit.conflicts = conflicts;
        commit.rebase_metadata = metadata;
        running = next;
    }
    running
}

/// Rebase engine over a history store
pub struct Rebaser<'h, H> {
    history: &'h H,
    config: RebaseConfig,
}

impl<'h, H> Rebaser<'h, H> {
    pub fn new(history: &'h H) -> Self {
        Self::with_config(history, RebaseConfig::default())
    }

    pub fn with_config(history: &'h H, config: RebaseConfig) -> Self {
        Self { history, config }
    }

    pub fn config(&self) -> &RebaseConfig {
        &self.config
    }

    /// Rebase `incoming` onto the current canonical head
    ///
    /// On success `incoming.delta` is relative to the returned head, both
    /// ancestry references point at it, and `conflicts`/`rebase_metadata`
    /// hold the final rebase's output. On error `incoming` is untouched.
    #[tracing::instrument(level = "debug", skip_all, fields(commit = %incoming.id))]
    pub async fn reconcile<D>(
        &self,
        incoming: &mut Commit<D>,
    ) -> Result<Reconciled<D>, RebaseError>
    where
        D: Delta,
        H: History<D>,
    {
        let mut local_chain = Vec::new();
        if !incoming.is_canonical_relative() {
            local_chain = self.rebuild_local_chain(incoming).await?;
        }

        let remote = self
            .history
            .canonical_range(&incoming.remote_head_id, None)
            .await?;
        let head = remote
            .last()
            .map_or_else(|| incoming.remote_head_id.clone(), |c| c.id.clone());
        tracing::debug!(remote = remote.len(), %head, "folding canonical history");

        let local_ids: BTreeSet<&CommitId> = local_chain.iter().map(|c| &c.id).collect();
        let mut conflicts = Vec::new();
        let (base, _) = self.fold(&remote, &local_chain, Some(&local_ids), &mut conflicts)?;

        let mut metadata = D::Metadata::default();
        base.rebase(&mut incoming.delta, &mut conflicts, &mut metadata);
        tracing::debug!(conflicts = conflicts.len(), "incoming commit rebased");

        incoming.conflicts = conflicts;
        incoming.rebase_metadata = metadata;
        incoming.repoint(&head);
        Ok(Reconciled { head, local_chain })
    }

    /// [`Rebaser::reconcile`], driven to completion on the current thread
    pub fn reconcile_blocking<D>(
        &self,
        incoming: &mut Commit<D>,
    ) -> Result<Reconciled<D>, RebaseError>
    where
        D: Delta,
        H: History<D>,
    {
        pollster::block_on(self.reconcile(incoming))
    }

    /// Rebuild the author's unsynchronized chain relative to their remote head
    async fn rebuild_local_chain<D>(
        &self,
        incoming: &Commit<D>,
    ) -> Result<Vec<Commit<D>>, RebaseError>
    where
        D: Delta,
        H: History<D>,
    {
        let start = incoming
            .local_branch_start_id
            .clone()
            .ok_or_else(|| RebaseError::MissingBranchStart(incoming.id.clone()))?;

        let mut local_chain = self.collect_local_chain(incoming, &start).await?;
        let prior = self.collect_prior_canonical(incoming, &start).await?;

        let window_start = prior
            .first()
            .or(local_chain.first())
            .map(|c| c.reference_id.clone())
            .ok_or_else(|| RebaseError::MissingBranchStart(incoming.id.clone()))?;
        let window = self
            .history
            .canonical_range(&window_start, Some(&incoming.remote_head_id))
            .await?;
        tracing::debug!(
            local = local_chain.len(),
            prior = prior.len(),
            window = window.len(),
            from = %window_start,
            to = %incoming.remote_head_id,
            "rebuilding local chain"
        );

        // Conflicts here were already reported when the prior chain landed.
        let mut scratch = Vec::new();
        let (base, consumed) = self.fold(&window, &prior, None, &mut scratch)?;
        if consumed < prior.len() {
            tracing::debug!(
                unmatched = prior.len() - consumed,
                "prior canonical commits outside the window"
            );
        }

        rebase_chain(base, &mut local_chain);
        if let Some(first) = local_chain.first_mut() {
            first.repoint(&incoming.remote_head_id);
        }
        Ok(local_chain)
    }

    /// Walk back from the incoming commit's reference to the branch start
    async fn collect_local_chain<D>(
        &self,
        incoming: &Commit<D>,
        start: &CommitId,
    ) -> Result<Vec<Commit<D>>, RebaseError>
    where
        D: Delta,
        H: History<D>,
    {
        let mut chain = Vec::new();
        let mut child = incoming.id.clone();
        let mut current = incoming.reference_id.clone();
        loop {
            self.check_depth(incoming, chain.len())?;
            let commit = self.resolve(&child, &current).await?;
            let reached = commit.id == *start;
            if !reached && commit.is_root() {
                tracing::warn!(%start, "local branch start is not an ancestor");
                return Err(RebaseError::BrokenHistory {
                    commit: incoming.id.clone(),
                    missing: start.clone(),
                });
            }
            child = commit.id.clone();
            current = commit.reference_id.clone();
            chain.push(commit);
            if reached {
                break;
            }
        }
        chain.reverse();
        Ok(chain)
    }

    /// Ancestors of the branch start, back to the first one that was
    /// authored relative to canonical history
    async fn collect_prior_canonical<D>(
        &self,
        incoming: &Commit<D>,
        start: &CommitId,
    ) -> Result<Vec<Commit<D>>, RebaseError>
    where
        D: Delta,
        H: History<D>,
    {
        let start_commit = self.resolve(&incoming.id, start).await?;
        let mut relative = start_commit.is_canonical_relative();
        let mut child = start_commit.id;
        let mut parent = start_commit.reference_id;

        let mut prior = Vec::new();
        while !relative {
            self.check_depth(incoming, prior.len())?;
            let commit = self.resolve(&child, &parent).await?;
            relative = commit.is_canonical_relative();
            child = commit.id.clone();
            parent = commit.reference_id.clone();
            prior.push(commit);
        }
        prior.reverse();
        Ok(prior)
    }

    /// Fold a canonical range into one base delta
    ///
    /// Canonical commits matching the head of `chain` are substituted and
    /// consume it. Returns the base and how many chain entries were used.
    fn fold<D: Delta>(
        &self,
        range: &[Commit<D>],
        chain: &[Commit<D>],
        local_ids: Option<&BTreeSet<&CommitId>>,
        conflicts: &mut Vec<D::Conflict>,
    ) -> Result<(D, usize), RebaseError> {
        let mut base = D::default();
        let mut cursor = 0;
        for canonical in range {
            match Fold::classify(&base, canonical, chain.get(cursor), conflicts) {
                Fold::Substituted {
                    based,
                    delta,
                    metadata,
                } => {
                    if self.config.verify_substitutions && delta != canonical.delta {
                        tracing::warn!(
                            commit = %canonical.id,
                            "substituted delta differs from canonical"
                        );
                        return Err(RebaseError::InterleavingMismatch(canonical.id.clone()));
                    }
                    base = based;
                    base.apply(&delta, Some(&metadata));
                    cursor += 1;
                }
                Fold::Verbatim(delta) => {
                    let after = local_ids
                        .filter(|ids| ids.contains(&canonical.id))
                        .map(|_| &canonical.rebase_metadata);
                    base.apply(delta, after);
                }
            }
        }
        Ok((base, cursor))
    }

    async fn resolve<D>(&self, child: &CommitId, id: &CommitId) -> Result<Commit<D>, RebaseError>
    where
        D: Delta,
        H: History<D>,
    {
        match self.history.resolve_commit(id).await? {
            Some(commit) => Ok(commit),
            None => {
                tracing::warn!(%child, missing = %id, "ancestry pointer does not resolve");
                Err(RebaseError::BrokenHistory {
                    commit: child.clone(),
                    missing: id.clone(),
                })
            }
        }
    }

    fn check_depth<D: Delta>(
        &self,
        incoming: &Commit<D>,
        depth: usize,
    ) -> Result<(), RebaseError> {
        if depth >= self.config.max_ancestry_depth {
            return Err(RebaseError::AncestryTooDeep {
                commit: incoming.id.clone(),
                limit: self.config.max_ancestry_depth,
            });
        }
        Ok(())
    }
}
