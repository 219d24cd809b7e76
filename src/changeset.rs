//! Property change sets
//!
//! A [`ChangeSet`] is a reversible tree delta: one [`PropertyOp`] per
//! property path, each carrying the values needed to undo it. Change sets
//! compose (`apply`), invert, and rebase against each other; these are the
//! primitives the rebase engine is written against.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::conflict::{Conflict, ConflictKind};
use crate::document::Document;
use crate::value::{Path, PropertyValue};

/// Edit to a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PropertyOp {
    /// Create a property that did not exist
    Insert { value: PropertyValue },
    /// Change the value of an existing property
    Modify {
        old: PropertyValue,
        new: PropertyValue,
    },
    /// Remove a property and create a new one at the same path
    Replace {
        old: PropertyValue,
        new: PropertyValue,
    },
    /// Delete an existing property
    Remove { old: PropertyValue },
}

/// Discriminant of a [`PropertyOp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Insert,
    Modify,
    Replace,
    Remove,
}

impl PropertyOp {
    pub fn kind(&self) -> OpKind {
        match self {
            PropertyOp::Insert { .. } => OpKind::Insert,
            PropertyOp::Modify { .. } => OpKind::Modify,
            PropertyOp::Replace { .. } => OpKind::Replace,
            PropertyOp::Remove { .. } => OpKind::Remove,
        }
    }

    /// Value the property must hold before this op (`None` = absent)
    pub fn before(&self) -> Option<&PropertyValue> {
        match self {
            PropertyOp::Insert { .. } => None,
            PropertyOp::Modify { old, .. }
            | PropertyOp::Replace { old, .. }
            | PropertyOp::Remove { old } => Some(old),
        }
    }

    /// Value the property holds after this op (`None` = absent)
    pub fn after(&self) -> Option<&PropertyValue> {
        match self {
            PropertyOp::Insert { value } => Some(value),
            PropertyOp::Modify { new, .. } | PropertyOp::Replace { new, .. } => Some(new),
            PropertyOp::Remove { .. } => None,
        }
    }

    /// The op that undoes this one
    pub fn inverted(self) -> PropertyOp {
        match self {
            PropertyOp::Insert { value } => PropertyOp::Remove { old: value },
            PropertyOp::Modify { old, new } => PropertyOp::Modify { old: new, new: old },
            PropertyOp::Replace { old, new } => PropertyOp::Replace { old: new, new: old },
            PropertyOp::Remove { old } => PropertyOp::Insert { value: old },
        }
    }
}

/// Interleaving metadata written by [`ChangeSet::rebase`]
///
/// Records, for every op that survived a rebase over a base op on the same
/// path, which kind of base op it now follows. Consumed by the next
/// [`ChangeSet::apply`] that places the rebased change after that base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AfterMetadata {
    entries: BTreeMap<Path, OpKind>,
}

impl AfterMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<Path>, base: OpKind) {
        self.entries.insert(path.into(), base);
    }

    pub fn get(&self, path: &str) -> Option<OpKind> {
        self.entries.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if the op at `path` was placed after a base that ended the
    /// previous property's identity
    fn follows_identity_break(&self, path: &str) -> bool {
        matches!(self.get(path), Some(OpKind::Remove | OpKind::Replace))
    }
}

/// Reversible tree delta
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    ops: BTreeMap<Path, PropertyOp>,
}

impl ChangeSet {
    /// Identity change set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an insert (composed onto what is already recorded)
    pub fn with_insert(mut self, path: impl Into<Path>, value: impl Into<PropertyValue>) -> Self {
        self.push(path.into(), PropertyOp::Insert { value: value.into() });
        self
    }

    /// Append a modify (composed onto what is already recorded)
    pub fn with_modify(
        mut self,
        path: impl Into<Path>,
        old: impl Into<PropertyValue>,
        new: impl Into<PropertyValue>,
    ) -> Self {
        let (old, new) = (old.into(), new.into());
        let op = if old.same_type(&new) {
            PropertyOp::Modify { old, new }
        } else {
            PropertyOp::Replace { old, new }
        };
        self.push(path.into(), op);
        self
    }

    /// Append a remove (composed onto what is already recorded)
    pub fn with_remove(mut self, path: impl Into<Path>, old: impl Into<PropertyValue>) -> Self {
        self.push(path.into(), PropertyOp::Remove { old: old.into() });
        self
    }

    pub fn get(&self, path: &str) -> Option<&PropertyOp> {
        self.ops.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &PropertyOp)> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Compose `next` onto this change set in place
    ///
    /// Afterwards `self` has the effect of applying the old `self` followed
    /// by `next`. `after` is the metadata produced when `next` was rebased
    /// onto a base ending where `self` ends.
    pub fn apply(&mut self, next: &ChangeSet, after: Option<&AfterMetadata>) {
        for (path, op) in &next.ops {
            let keep_break = after.is_some_and(|m| m.follows_identity_break(path));
            match self.ops.remove(path) {
                None => {
                    self.ops.insert(path.clone(), op.clone());
                }
                Some(first) => {
                    if let Some(composed) = compose(first, op, keep_break) {
                        self.ops.insert(path.clone(), composed);
                    }
                }
            }
        }
    }

    /// Turn this change set into its inverse in place
    pub fn invert(&mut self) {
        let ops = core::mem::take(&mut self.ops);
        self.ops = ops
            .into_iter()
            .map(|(path, op)| (path, op.inverted()))
            .collect();
    }

    /// Inverted copy
    pub fn inverted(&self) -> ChangeSet {
        let mut copy = self.clone();
        copy.invert();
        copy
    }

    /// Rebase `delta` so that it can be applied after `self`
    ///
    /// `delta` was authored against the state `self` starts from. On
    /// return it is expressed against the state `self` ends in. Colliding
    /// edits are resolved in favour of `delta` except where `self` removed
    /// the property; every collision is appended to `conflicts`.
    pub fn rebase(
        &self,
        delta: &mut ChangeSet,
        conflicts: &mut Vec<Conflict>,
        after: &mut AfterMetadata,
    ) {
        let ops = core::mem::take(&mut delta.ops);
        for (path, op) in ops {
            let Some(base) = self.ops.get(&path) else {
                delta.ops.insert(path, op);
                continue;
            };
            let (rebased, conflict) = transform(base, &op);
            if let Some(kind) = conflict {
                conflicts.push(Conflict {
                    path: path.clone(),
                    kind,
                    base: base.clone(),
                    incoming: op,
                });
            }
            if let Some(rebased) = rebased {
                after.record(path.clone(), base.kind());
                delta.ops.insert(path, rebased);
            }
        }
    }

    /// Change set that turns `old` into `new`
    pub fn diff(old: &Document, new: &Document) -> ChangeSet {
        let mut ops = BTreeMap::new();
        for (path, value) in old.iter() {
            match new.get(path) {
                None => {
                    ops.insert(path.clone(), PropertyOp::Remove { old: value.clone() });
                }
                Some(next) => {
                    if let Some(op) = changed(value.clone(), next.clone()) {
                        ops.insert(path.clone(), op);
                    }
                }
            }
        }
        for (path, value) in new.iter() {
            if !old.contains(path) {
                ops.insert(path.clone(), PropertyOp::Insert { value: value.clone() });
            }
        }
        ChangeSet { ops }
    }

    fn push(&mut self, path: Path, op: PropertyOp) {
        let single = ChangeSet {
            ops: BTreeMap::from([(path, op)]),
        };
        self.apply(&single, None);
    }
}

/// `Modify`, `Replace` or nothing, depending on how `old` and `new` differ
fn changed(old: PropertyValue, new: PropertyValue) -> Option<PropertyOp> {
    if old == new {
        None
    } else if old.same_type(&new) {
        Some(PropertyOp::Modify { old, new })
    } else {
        Some(PropertyOp::Replace { old, new })
    }
}

/// Compose two ops on the same path (`first` then `second`)
fn compose(first: PropertyOp, second: &PropertyOp, keep_break: bool) -> Option<PropertyOp> {
    use PropertyOp::{Insert, Modify, Remove, Replace};

    match (first, second) {
        (Insert { .. }, Insert { value })
        | (Insert { .. }, Modify { new: value, .. } | Replace { new: value, .. }) => {
            Some(Insert {
                value: value.clone(),
            })
        }
        (Insert { .. }, Remove { .. }) => None,
        (Modify { old, .. }, Modify { new, .. }) => changed(old, new.clone()),
        (Modify { old, .. } | Replace { old, .. }, Replace { new, .. } | Insert { value: new })
        | (Replace { old, .. }, Modify { new, .. }) => Some(Replace {
            old,
            new: new.clone(),
        }),
        (Modify { old, .. } | Replace { old, .. }, Remove { .. }) => Some(Remove { old }),
        (Remove { old }, Insert { value }) => {
            if keep_break {
                Some(Replace {
                    old,
                    new: value.clone(),
                })
            } else {
                changed(old, value.clone())
            }
        }
        // Nothing left to modify or remove; the removal stands.
        (Remove { old }, Modify { .. } | Replace { .. } | Remove { .. }) => Some(Remove { old }),
    }
}

/// Transform `op` (authored before `base`) to apply after `base`
fn transform(base: &PropertyOp, op: &PropertyOp) -> (Option<PropertyOp>, Option<ConflictKind>) {
    use PropertyOp::{Insert, Modify, Remove, Replace};

    match (base, op) {
        (Insert { value: theirs }, Insert { value: ours }) => {
            let conflict = (theirs != ours).then_some(ConflictKind::InsertedEntryWithSameKey);
            (changed(theirs.clone(), ours.clone()), conflict)
        }
        (Insert { value: theirs }, Modify { new: ours, .. } | Replace { new: ours, .. }) => (
            changed(theirs.clone(), ours.clone()),
            Some(ConflictKind::InconsistentBase),
        ),
        (Insert { value: theirs }, Remove { .. }) => (
            Some(Remove { old: theirs.clone() }),
            Some(ConflictKind::InconsistentBase),
        ),
        (Modify { new: theirs, .. } | Replace { new: theirs, .. }, Modify { new: ours, .. }) => {
            if theirs == ours {
                (None, None)
            } else {
                (
                    changed(theirs.clone(), ours.clone()),
                    Some(ConflictKind::CollidingSet),
                )
            }
        }
        (Modify { new: theirs, .. } | Replace { new: theirs, .. }, Replace { new: ours, .. }) => {
            if theirs == ours {
                (None, None)
            } else {
                (
                    Some(Replace {
                        old: theirs.clone(),
                        new: ours.clone(),
                    }),
                    Some(ConflictKind::CollidingSet),
                )
            }
        }
        (Modify { new: theirs, .. } | Replace { new: theirs, .. }, Remove { .. }) => (
            Some(Remove { old: theirs.clone() }),
            Some(ConflictKind::RemovedModifiedEntry),
        ),
        (Modify { new: theirs, .. } | Replace { new: theirs, .. }, Insert { value: ours }) => (
            changed(theirs.clone(), ours.clone()),
            Some(ConflictKind::InconsistentBase),
        ),
        (Remove { .. }, Modify { .. } | Replace { .. }) => {
            (None, Some(ConflictKind::EntryModifiedAfterRemove))
        }
        (Remove { .. }, Remove { .. }) => (None, None),
        (Remove { .. }, Insert { value }) => (
            Some(Insert {
                value: value.clone(),
            }),
            Some(ConflictKind::InconsistentBase),
        ),
    }
}
