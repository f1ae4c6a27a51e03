//! Structural paths and dotted name paths
//!
//! Both are rebuilt top-down on every traversal. Extending one always
//! returns a new value; the parent's path is never touched, so siblings can
//! be visited from the same base.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use smallvec::SmallVec;

/// Default separator between name path segments
pub const NAME_SEPARATOR: &str = ".";

/// A chain of list indices from the root of the AST
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(SmallVec<[usize; 12]>);

impl Path {
    /// The empty path (the root list itself)
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    /// Append a child index followed by fixed structural offsets
    pub fn extend(&self, index: usize, offsets: &[usize]) -> Path {
        let mut next = self.0.clone();
        next.push(index);
        next.extend_from_slice(offsets);
        Path(next)
    }

    /// Append offsets only
    pub fn join(&self, offsets: &[usize]) -> Path {
        let mut next = self.0.clone();
        next.extend_from_slice(offsets);
        Path(next)
    }

    /// The path without its last step
    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.0.split_last()?;
        Some(Path(SmallVec::from_slice(parent)))
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable hash of the path, usable as a render key
    pub fn key(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

impl AsRef<[usize]> for Path {
    fn as_ref(&self) -> &[usize] {
        &self.0
    }
}

impl From<&[usize]> for Path {
    fn from(steps: &[usize]) -> Self {
        Path(SmallVec::from_slice(steps))
    }
}

impl From<Vec<usize>> for Path {
    fn from(steps: Vec<usize>) -> Self {
        Path(SmallVec::from_vec(steps))
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(steps: [usize; N]) -> Self {
        Path(steps.into_iter().collect())
    }
}

impl FromIterator<usize> for Path {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Extend a dotted name path with a field name or repetition index
pub fn extend_name_path(base: Option<&str>, segment: impl fmt::Display) -> String {
    extend_name_path_with(base, segment, NAME_SEPARATOR)
}

/// [`extend_name_path`] with a custom separator
pub fn extend_name_path_with(
    base: Option<&str>,
    segment: impl fmt::Display,
    separator: &str,
) -> String {
    match base {
        Some(base) => format!("{base}{separator}{segment}"),
        None => segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_leaves_base_untouched() {
        let base = Path::from([0, 1]);
        let child = base.extend(3, &[5]);
        assert_eq!(base.as_slice(), &[0, 1]);
        assert_eq!(child.as_slice(), &[0, 1, 3, 5]);
        assert_eq!(child.join(&[2]).as_slice(), &[0, 1, 3, 5, 2]);
    }

    #[test]
    fn test_parent() {
        assert_eq!(Path::from([4, 1]).parent(), Some(Path::from([4])));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Path::from([10, 1, 5, 0, 0, 1]).to_string(), "10,1,5,0,0,1");
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn test_key_is_stable_and_distinct() {
        assert_eq!(Path::from([0, 1]).key(), Path::from([0, 1]).key());
        assert_ne!(Path::from([0, 1]).key(), Path::from([1, 1]).key());
    }

    #[test]
    fn test_name_paths() {
        assert_eq!(extend_name_path(None, "items"), "items");
        assert_eq!(extend_name_path(Some("items"), 2), "items.2");
        assert_eq!(extend_name_path(Some("items.2"), "label"), "items.2.label");
        assert_eq!(extend_name_path_with(Some("a"), "b", "/"), "a/b");
    }
}
