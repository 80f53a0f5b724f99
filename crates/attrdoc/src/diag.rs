//! Severity-tagged, optionally path-attributed diagnostics.
//!
//! Every facade operation reports problems by returning a [`Diagnostics`]
//! collection instead of failing. Only `Error` entries signal failure;
//! warnings are carried through to the caller untouched.

use crate::{AttrError, Path};
use serde::Serialize;
use std::fmt;

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Terminal failure of the operation that produced it.
    Error,
    /// Informational; never blocks.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Short summary.
    pub summary: String,
    /// Longer explanation.
    pub detail: String,
    /// Location the diagnostic refers to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
}

impl Diagnostic {
    /// An error without a path.
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            path: None,
        }
    }

    /// A warning without a path.
    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            path: None,
        }
    }

    /// An error attributed to `path`.
    pub fn attribute_error(
        path: &Path,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::error(summary, detail).with_path(path.clone())
    }

    /// A warning attributed to `path`.
    pub fn attribute_warning(
        path: &Path,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::warning(summary, detail).with_path(path.clone())
    }

    /// Attach a path, replacing any existing one.
    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    /// Whether this is an error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(path) = &self.path {
            write!(f, " at {}", path)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered, append-only collection of diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection.
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append one diagnostic.
    #[inline]
    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    /// Append every diagnostic from `other`, in order.
    #[inline]
    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Append an error.
    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary, detail));
    }

    /// Append a warning.
    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    /// Append an error attributed to `path`.
    pub fn add_attribute_error(
        &mut self,
        path: &Path,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::attribute_error(path, summary, detail));
    }

    /// Append a warning attributed to `path`.
    pub fn add_attribute_warning(
        &mut self,
        path: &Path,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.push(Diagnostic::attribute_warning(path, summary, detail));
    }

    /// Whether any entry is an error.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    /// Number of error entries.
    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    /// Number of warning entries.
    pub fn warning_count(&self) -> usize {
        self.0.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    /// Attach `path` to every entry that has none.
    pub fn attribute_unpathed(mut self, path: &Path) -> Self {
        for d in &mut self.0 {
            if d.path.is_none() {
                d.path = Some(path.clone());
            }
        }
        self
    }

    /// Whether the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the entries.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(d: Diagnostic) -> Self {
        Self(vec![d])
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Diagnostics {
    type Output = Diagnostic;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Detail text shared by every "this is a provider bug" diagnostic.
pub(crate) fn provider_bug_detail(action: &str, err: impl fmt::Display) -> String {
    format!(
        "An unexpected error was encountered trying to {}. This is always an error in the provider. \
         Please report the following to the provider developer:\n\n{}",
        action, err
    )
}

/// Convert an internal error into an error diagnostic.
pub(crate) fn error_diagnostic(
    path: Option<&Path>,
    summary: &str,
    action: &str,
    err: &AttrError,
) -> Diagnostic {
    let diag = Diagnostic::error(summary, provider_bug_detail(action, err));
    match path {
        Some(p) => diag.with_path(p.clone()),
        None => diag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn test_append_preserves_order() {
        let mut a = Diagnostics::new();
        a.add_warning("first", "");
        let mut b = Diagnostics::new();
        b.add_error("second", "");
        b.add_warning("third", "");
        a.append(b);
        let summaries: Vec<_> = a.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(summaries, ["first", "second", "third"]);
    }

    #[test]
    fn test_has_error_only_for_error_severity() {
        let mut diags = Diagnostics::new();
        diags.add_warning("w", "");
        assert!(!diags.has_error());
        diags.add_attribute_error(&path!("a"), "e", "");
        assert!(diags.has_error());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
    }

    #[test]
    fn test_attribute_unpathed_keeps_existing_paths() {
        let diags: Diagnostics = vec![
            Diagnostic::error("a", ""),
            Diagnostic::attribute_error(&path!("x"), "b", ""),
        ]
        .into_iter()
        .collect();
        let diags = diags.attribute_unpathed(&path!("name"));
        assert_eq!(diags[0].path, Some(path!("name")));
        assert_eq!(diags[1].path, Some(path!("x")));
    }

    #[test]
    fn test_serialize() {
        let d = Diagnostic::attribute_warning(&path!("name"), "Careful", "details");
        let json = serde_json::to_value(Diagnostics::from(d)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "severity": "warning",
                "summary": "Careful",
                "detail": "details",
                "path": "$.name"
            }])
        );
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::attribute_error(&path!("name"), "Bad", "really");
        assert_eq!(d.to_string(), "error: Bad at $.name: really");
    }
}
