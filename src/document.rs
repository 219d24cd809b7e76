//! Materialized documents
//!
//! A [`Document`] is the state a sequence of change sets produces: a
//! property tree stored flat, keyed by dotted path. Applying a change set is
//! strict: every recorded old value must match before anything is written.
//!
//! Author: Moroya Sakamoto

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::changeset::{ChangeSet, PropertyOp};
use crate::error::ApplyError;
use crate::value::{fnv1a, Path, PropertyValue, PATH_SEPARATOR};

/// Property tree, flat storage with O(log n) path lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    properties: BTreeMap<Path, PropertyValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property directly, bypassing change tracking
    pub fn set(&mut self, path: impl Into<Path>, value: impl Into<PropertyValue>) {
        self.properties.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&PropertyValue> {
        self.properties.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.properties.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &PropertyValue)> {
        self.properties.iter()
    }

    /// Names of the direct children below `prefix` (`""` for the root)
    pub fn children(&self, prefix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for path in self.properties.keys() {
            let rest = if prefix.is_empty() {
                path.as_str()
            } else {
                match path
                    .strip_prefix(prefix)
                    .and_then(|r| r.strip_prefix(PATH_SEPARATOR))
                {
                    Some(rest) => rest,
                    None => continue,
                }
            };
            let name = rest.split(PATH_SEPARATOR).next().unwrap_or(rest);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Apply a change set
    ///
    /// All preconditions are checked before the first write, so a failed
    /// application leaves the document untouched.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<(), ApplyError> {
        for (path, op) in changes.iter() {
            self.check(path, op)?;
        }
        for (path, op) in changes.iter() {
            match op.after() {
                Some(value) => {
                    self.properties.insert(path.clone(), value.clone());
                }
                None => {
                    self.properties.remove(path);
                }
            }
        }
        Ok(())
    }

    fn check(&self, path: &Path, op: &PropertyOp) -> Result<(), ApplyError> {
        match (op.before(), self.properties.get(path)) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(ApplyError::AlreadyExists(path.clone())),
            (Some(_), None) => Err(ApplyError::Missing(path.clone())),
            (Some(expected), Some(actual)) if expected == actual => Ok(()),
            (Some(expected), Some(actual)) => Err(ApplyError::StaleValue {
                path: path.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            }),
        }
    }

    /// Content hash of the whole document (FNV-1a)
    pub fn digest(&self) -> u64 {
        let mut h: u64 = 0xcbf29ce484222325;
        for (path, value) in &self.properties {
            fnv1a(&mut h, path.as_bytes());
            // path terminator
            fnv1a(&mut h, &[0]);
            value.hash_into(&mut h);
        }
        h
    }
}
