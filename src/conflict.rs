//! Rebase conflicts
//!
//! A conflict marks a path where the base and the rebased change made
//! incompatible edits. Conflicts never abort a rebase: the change set
//! primitives pick a winner and report what they overrode.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};

use crate::changeset::PropertyOp;
use crate::value::Path;

/// What kind of collision was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides inserted the same path with different values
    InsertedEntryWithSameKey,
    /// Both sides set the same path to different values; the rebased side wins
    CollidingSet,
    /// The rebased change edits a property the base removed; the edit is dropped
    EntryModifiedAfterRemove,
    /// The rebased change removes a property the base modified; the removal wins
    RemovedModifiedEntry,
    /// Base and rebased change disagree on whether the property existed
    InconsistentBase,
}

impl ConflictKind {
    pub fn description(self) -> &'static str {
        match self {
            ConflictKind::InsertedEntryWithSameKey => "inserted entry with same key",
            ConflictKind::CollidingSet => "colliding set",
            ConflictKind::EntryModifiedAfterRemove => "entry modified after remove",
            ConflictKind::RemovedModifiedEntry => "removed modified entry",
            ConflictKind::InconsistentBase => "inconsistent base",
        }
    }
}

/// Rebase conflict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Path that has conflicting edits
    pub path: Path,
    /// How the collision was resolved
    pub kind: ConflictKind,
    /// Operation from the base being rebased over
    pub base: PropertyOp,
    /// Operation from the rebased change, as it was before the rebase
    pub incoming: PropertyOp,
}

impl Conflict {
    pub fn description(&self) -> &'static str {
        self.kind.description()
    }
}
