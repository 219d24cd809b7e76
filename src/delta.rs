//! Delta primitive contract
//!
//! The rebase engine never looks inside a delta. It only composes, inverts
//! and rebases them through [`Delta`]; [`ChangeSet`] is the implementation
//! shipped with this crate.
//!
//! Author: Moroya Sakamoto

use core::fmt::Debug;

use crate::changeset::{AfterMetadata, ChangeSet};
use crate::conflict::Conflict;

/// Tree delta the engine can reconcile
///
/// `Default` must be the identity delta.
pub trait Delta: Clone + Default + PartialEq + Debug {
    /// Interleaving metadata produced by `rebase`, consumed by `apply`
    type Metadata: Clone + Default + PartialEq + Debug;
    /// Conflict descriptor appended by `rebase`
    type Conflict: Clone + PartialEq + Debug;

    /// Compose `next` onto `self` in place
    fn apply(&mut self, next: &Self, after: Option<&Self::Metadata>);

    /// Replace `self` by the delta that undoes it
    fn invert(&mut self);

    /// Transform `delta` so that it applies after `self`
    fn rebase(
        &self,
        delta: &mut Self,
        conflicts: &mut Vec<Self::Conflict>,
        after: &mut Self::Metadata,
    );

    /// True if applying this delta changes nothing
    fn is_identity(&self) -> bool;
}

impl Delta for ChangeSet {
    type Metadata = AfterMetadata;
    type Conflict = Conflict;

    fn apply(&mut self, next: &Self, after: Option<&AfterMetadata>) {
        ChangeSet::apply(self, next, after);
    }

    fn invert(&mut self) {
        ChangeSet::invert(self);
    }

    fn rebase(&self, delta: &mut Self, conflicts: &mut Vec<Conflict>, after: &mut AfterMetadata) {
        ChangeSet::rebase(self, delta, conflicts, after);
    }

    fn is_identity(&self) -> bool {
        self.is_empty()
    }
}
