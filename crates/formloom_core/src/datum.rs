//! Persistent form data
//!
//! [`Datum`] is the immutable, JSON-like representation every form AST is
//! stored in. Lists and maps are reference counted:
//!
//! - cloning a tree of any depth is O(1)
//! - [`Datum::set_in`] and [`Datum::delete_in`] rebuild only the spine from
//!   the root to the edited node; every untouched sibling is shared with the
//!   previous version (`Arc::ptr_eq` holds for it)
//!
//! ```rust
//! use formloom_core::Datum;
//! use serde_json::json;
//!
//! let before = Datum::from(json!([["field", ["name", "text", "a"]], ["field", ["other", "text", "b"]]]));
//! let after = before.set_in(&[0, 1, 2], Datum::from("z")).unwrap();
//!
//! assert_eq!(after.get_in(&[0, 1, 2]).and_then(Datum::as_str), Some("z"));
//! assert!(before.get(1).unwrap().ptr_eq(after.get(1).unwrap()));
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value as Json};

/// Shared `null`, handy as a fallback for missing slots
pub static NULL: Datum = Datum::Null;

/// An immutable, structurally shared JSON-like value
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Datum {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    List(Arc<Vec<Datum>>),
    Map(Arc<IndexMap<String, Datum>>),
}

impl Datum {
    /// Build a list from any sequence of data
    pub fn list(items: impl IntoIterator<Item = Datum>) -> Self {
        Datum::List(Arc::new(items.into_iter().collect()))
    }

    /// An empty list
    pub fn empty_list() -> Self {
        Datum::List(Arc::new(Vec::new()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Datum]> {
        match self {
            Datum::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Datum>> {
        match self {
            Datum::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Number of items in a list or entries in a map, zero otherwise
    pub fn len(&self) -> usize {
        match self {
            Datum::List(items) => items.len(),
            Datum::Map(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two data are the same allocation.
    ///
    /// Lists and maps compare by pointer; scalars have no identity and
    /// compare by value.
    pub fn ptr_eq(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::List(a), Datum::List(b)) => Arc::ptr_eq(a, b),
            (Datum::Map(a), Datum::Map(b)) => Arc::ptr_eq(a, b),
            (Datum::String(a), Datum::String(b)) => Arc::ptr_eq(a, b) || a == b,
            (a, b) => a == b,
        }
    }

    /// Get a list item by index
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.as_list().and_then(|items| items.get(index))
    }

    /// Follow a chain of list indices
    pub fn get_in(&self, path: &[usize]) -> Option<&Datum> {
        path.iter().try_fold(self, |node, &index| node.get(index))
    }

    /// Return a new tree with the node at `path` replaced by `value`.
    ///
    /// Only the lists along `path` are copied. Returns `None` when the path
    /// does not resolve.
    pub fn set_in(&self, path: &[usize], value: Datum) -> Option<Datum> {
        let Some((&index, rest)) = path.split_first() else {
            return Some(value);
        };
        let items = self.as_list()?;
        let updated = items.get(index)?.set_in(rest, value)?;
        let mut next = items.to_vec();
        next[index] = updated;
        Some(Datum::List(Arc::new(next)))
    }

    /// Return a new tree with the list item at `path` removed.
    ///
    /// Later siblings shift down by one. Returns `None` for an empty path or
    /// one that does not resolve.
    pub fn delete_in(&self, path: &[usize]) -> Option<Datum> {
        let (&last, parent) = path.split_last()?;
        let items = self.get_in(parent)?.as_list()?;
        if last >= items.len() {
            return None;
        }
        let mut next = items.to_vec();
        next.remove(last);
        self.set_in(parent, Datum::List(Arc::new(next)))
    }

    /// Deep-copy a JSON value
    pub fn from_json(value: &Json) -> Self {
        match value {
            Json::Null => Datum::Null,
            Json::Bool(b) => Datum::Bool(*b),
            Json::Number(n) => Datum::Number(n.clone()),
            Json::String(s) => Datum::String(Arc::from(s.as_str())),
            Json::Array(items) => Datum::list(items.iter().map(Datum::from_json)),
            Json::Object(map) => Datum::Map(Arc::new(
                map.iter()
                    .map(|(k, v)| (k.clone(), Datum::from_json(v)))
                    .collect(),
            )),
        }
    }

    /// Project back into plain JSON
    pub fn to_json(&self) -> Json {
        match self {
            Datum::Null => Json::Null,
            Datum::Bool(b) => Json::Bool(*b),
            Datum::Number(n) => Json::Number(n.clone()),
            Datum::String(s) => Json::String(s.to_string()),
            Datum::List(items) => Json::Array(items.iter().map(Datum::to_json).collect()),
            Datum::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Json> for Datum {
    fn from(value: Json) -> Self {
        Datum::from_json(&value)
    }
}

impl From<&Json> for Datum {
    fn from(value: &Json) -> Self {
        Datum::from_json(value)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::String(Arc::from(v))
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::String(Arc::from(v))
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Number(v.into())
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Number(v.into())
    }
}

impl From<usize> for Datum {
    fn from(v: usize) -> Self {
        Datum::Number(v.into())
    }
}

impl From<f64> for Datum {
    /// Non-finite floats have no JSON form and become `Null`
    fn from(v: f64) -> Self {
        Number::from_f64(v).map_or(Datum::Null, Datum::Number)
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(items: Vec<Datum>) -> Self {
        Datum::List(Arc::new(items))
    }
}

impl FromIterator<Datum> for Datum {
    fn from_iter<I: IntoIterator<Item = Datum>>(iter: I) -> Self {
        Datum::list(iter)
    }
}

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Json::deserialize(deserializer).map(Datum::from)
    }
}
