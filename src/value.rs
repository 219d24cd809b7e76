//! Typed property values
//!
//! Leaf values stored at property paths in a shared document. Tree shape
//! is carried by dotted paths (`"scene.sphere.radius"`), values by
//! [`PropertyValue`].
//!
//! Author: Moroya Sakamoto

use core::fmt;

use serde::{Deserialize, Serialize};

/// Dotted property path
pub type Path = String;

/// Path separator
pub const PATH_SEPARATOR: char = '.';

/// Value stored at a property path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
}

impl PropertyValue {
    /// Property typeid this value was written with
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "Bool",
            PropertyValue::Int(_) => "Int64",
            PropertyValue::Float(_) => "Float64",
            PropertyValue::String(_) => "String",
        }
    }

    /// True if both values carry the same typeid
    pub fn same_type(&self, other: &PropertyValue) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// Feed a stable byte encoding into an FNV-1a state
    pub(crate) fn hash_into(&self, h: &mut u64) {
        fnv1a(h, self.type_name().as_bytes());
        match self {
            PropertyValue::Bool(b) => fnv1a(h, &[u8::from(*b)]),
            PropertyValue::Int(i) => fnv1a(h, &i.to_le_bytes()),
            PropertyValue::Float(f) => fnv1a(h, &f.to_bits().to_le_bytes()),
            PropertyValue::String(s) => fnv1a(h, s.as_bytes()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(String::from(v))
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::String(v)
    }
}

/// FNV-1a step over a byte slice
pub(crate) fn fnv1a(h: &mut u64, bytes: &[u8]) {
    for &b in bytes {
        *h ^= u64::from(b);
        *h = h.wrapping_mul(0x100000001b3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(PropertyValue::from("a").type_name(), "String");
        assert_eq!(PropertyValue::from(1i64).type_name(), "Int64");
        assert_eq!(PropertyValue::from(1.5).type_name(), "Float64");
        assert_eq!(PropertyValue::from(true).type_name(), "Bool");
    }

    #[test]
    fn test_same_type_ignores_payload() {
        assert!(PropertyValue::from("a").same_type(&PropertyValue::from("b")));
        assert!(!PropertyValue::from("1").same_type(&PropertyValue::from(1i64)));
    }

    #[test]
    fn test_display_quotes_strings() {
        assert_eq!(PropertyValue::from("Hello").to_string(), "\"Hello\"");
        assert_eq!(PropertyValue::from(42i64).to_string(), "42");
    }

    #[test]
    fn test_hash_distinguishes_types() {
        let mut a = 0xcbf29ce484222325;
        let mut b = 0xcbf29ce484222325;
        PropertyValue::Int(1).hash_into(&mut a);
        PropertyValue::Bool(true).hash_into(&mut b);
        assert_ne!(a, b);
    }
}
