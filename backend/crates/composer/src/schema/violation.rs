//! Schema violations
//!
//! A [`Violation`] points at the offending value with a JSON pointer
//! (`""` is the record itself, `/email` a top-level field, `/tags/0` the first
//! array element) and names the keyword that rejected it.

use serde::Serialize;
use std::fmt;

/// Single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    path: String,
    keyword: String,
    message: String,
}

impl Violation {
    pub fn new(
        path: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }

    /// JSON pointer to the offending value
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Schema keyword that failed (`required`, `format`, `type`, ...)
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data{} {}", self.path, self.message)
    }
}

/// Render violations as one line, comma separated
pub(crate) fn summarize(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "No errors".to_string();
    }
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Append one reference token to a JSON pointer (RFC 6901 escaping)
pub(crate) fn child_path(parent: &str, token: &str) -> String {
    let escaped = token.replace('~', "~0").replace('/', "~1");
    format!("{parent}/{escaped}")
}
