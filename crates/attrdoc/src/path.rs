//! Attribute paths for navigating a value tree.
//!
//! A path is an immutable sequence of steps. Each step either selects an
//! object attribute, a map entry, a list element, or a set element (by value).

use crate::value::Value;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single step in an attribute path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Step {
    /// Object attribute access: `.name`
    AttributeName(String),
    /// Map entry access: `["key"]`
    ElementKeyString(String),
    /// List element access: `[0]`
    ElementKeyInt(usize),
    /// Set element access, selecting the element equal to the given value.
    ElementKeyValue(Value),
}

impl Step {
    /// Create an attribute name step.
    #[inline]
    pub fn attr(name: impl Into<String>) -> Self {
        Step::AttributeName(name.into())
    }

    /// Create a map key step.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Step::ElementKeyString(k.into())
    }

    /// Create a list index step.
    #[inline]
    pub fn index(i: usize) -> Self {
        Step::ElementKeyInt(i)
    }

    /// Create a set element step.
    #[inline]
    pub fn element(v: Value) -> Self {
        Step::ElementKeyValue(v)
    }

    /// Get the attribute name if this is an attribute step.
    #[inline]
    pub fn as_attribute_name(&self) -> Option<&str> {
        match self {
            Step::AttributeName(n) => Some(n),
            _ => None,
        }
    }

    /// Short name of the step kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::AttributeName(_) => "attribute name",
            Step::ElementKeyString(_) => "map key",
            Step::ElementKeyInt(_) => "list index",
            Step::ElementKeyValue(_) => "set element",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::AttributeName(n) => write!(f, ".{}", n),
            Step::ElementKeyString(k) => write!(f, "[{:?}]", k),
            Step::ElementKeyInt(i) => write!(f, "[{}]", i),
            Step::ElementKeyValue(v) => write!(f, "[{}]", v),
        }
    }
}

impl From<String> for Step {
    fn from(s: String) -> Self {
        Step::AttributeName(s)
    }
}

impl From<&str> for Step {
    fn from(s: &str) -> Self {
        Step::AttributeName(s.to_owned())
    }
}

impl From<usize> for Step {
    fn from(i: usize) -> Self {
        Step::ElementKeyInt(i)
    }
}

/// A complete path into a value tree.
///
/// Paths are immutable: every builder method returns a new path and leaves
/// `self` untouched, so a parent path can be shared across sibling descents.
///
/// # Examples
///
/// ```
/// use attrdoc::Path;
///
/// let parent = Path::root().attr("users");
/// let child = parent.index(0).attr("name");
/// assert_eq!(parent.len(), 1);
/// assert_eq!(child.len(), 3);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Step>);

impl Path {
    /// Create an empty path (root).
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create a path from a vector of steps.
    #[inline]
    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    /// Return a new path with one more step.
    #[inline]
    pub fn with_step(&self, step: Step) -> Path {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.extend(self.0.iter().cloned());
        steps.push(step);
        Path(steps)
    }

    /// Return a new path with an attribute name step appended.
    #[inline]
    pub fn attr(&self, name: impl Into<String>) -> Path {
        self.with_step(Step::AttributeName(name.into()))
    }

    /// Return a new path with a map key step appended.
    #[inline]
    pub fn key(&self, k: impl Into<String>) -> Path {
        self.with_step(Step::ElementKeyString(k.into()))
    }

    /// Return a new path with a list index step appended.
    #[inline]
    pub fn index(&self, i: usize) -> Path {
        self.with_step(Step::ElementKeyInt(i))
    }

    /// Return a new path with a set element step appended.
    #[inline]
    pub fn element(&self, v: Value) -> Path {
        self.with_step(Step::ElementKeyValue(v))
    }

    /// Get the steps of this path.
    #[inline]
    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Check if this path is empty (root).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of steps in this path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the last step.
    #[inline]
    pub fn last(&self) -> Option<&Step> {
        self.0.last()
    }

    /// Join this path with another path.
    #[inline]
    pub fn join(&self, other: &Path) -> Path {
        let mut result = self.clone();
        result.0.extend(other.0.iter().cloned());
        result
    }

    /// Get the parent path (path without the last step).
    #[inline]
    pub fn parent(&self) -> Option<Path> {
        match self.0.split_last() {
            Some((_, rest)) => Some(Path(rest.to_vec())),
            None => None,
        }
    }

    /// Check if this path is a prefix of another path.
    ///
    /// ```
    /// use attrdoc::path;
    ///
    /// let parent = path!("user");
    /// let child = path!("user", "name");
    ///
    /// assert!(parent.is_prefix_of(&child));
    /// assert!(!child.is_prefix_of(&parent));
    /// assert!(parent.is_prefix_of(&parent));
    /// ```
    #[inline]
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Get a slice of steps from start to end.
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> Path {
        Path(self.0[start..end].to_vec())
    }

    /// Iterate over the steps.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromIterator<Step> for Path {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Step;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Construct a `Path` from a sequence of steps.
///
/// String literals become attribute name steps and integers become list
/// index steps. Any other `Step` may be passed directly.
///
/// ```
/// use attrdoc::{path, Step};
///
/// let p = path!("users", 0, "name");
/// let q = path!("tags", Step::key("env"));
/// assert_eq!(p.len(), 3);
/// assert_eq!(q.len(), 2);
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($step:expr),+ $(,)?) => {{
        $crate::Path::from_steps(vec![$($crate::Step::from($step)),+])
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_construction() {
        let path = Path::root().attr("users").index(0).attr("name");
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], Step::attr("users"));
        assert_eq!(path[1], Step::ElementKeyInt(0));
        assert_eq!(path[2], Step::attr("name"));
    }

    #[test]
    fn test_builder_does_not_mutate_parent() {
        let parent = path!("a");
        let left = parent.attr("b");
        let right = parent.attr("c");
        assert_eq!(parent, path!("a"));
        assert_ne!(left, right);
    }

    #[test]
    fn test_path_display() {
        let path = Path::root().attr("users").index(0).key("env").attr("name");
        assert_eq!(path.to_string(), "$.users[0][\"env\"].name");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn test_path_equality_is_structural() {
        assert_eq!(path!("a", 1), Path::root().attr("a").index(1));
        assert_ne!(path!("a", "b"), Path::root().attr("a").key("b"));
    }

    #[test]
    fn test_path_as_map_key() {
        let mut seen = std::collections::HashMap::new();
        seen.insert(path!("a", 0), 1);
        seen.insert(path!("a", 0), 2);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[&path!("a", 0)], 2);
    }

    #[test]
    fn test_path_parent_and_prefix() {
        let path = path!("a", "b");
        let parent = path.parent().unwrap();
        assert_eq!(parent, path!("a"));
        assert!(parent.is_prefix_of(&path));
        assert!(Path::root().parent().is_none());
    }

    #[test]
    fn test_path_serializes_as_string() {
        let json = serde_json::to_value(path!("users", 0)).unwrap();
        assert_eq!(json, serde_json::json!("$.users[0]"));
    }
}
