//! Descriptor parsers and their shared report type.
//!
//! Both parsers are plain functions over an already-decoded value tree and
//! return a [`ParseReport`]. A malformed entry never stops its siblings from
//! parsing; its problem is recorded and parsing moves on.

pub mod legacy;
pub mod structured;

use std::fmt;

use crate::error::{Error, ErrorKind};
use crate::metadata::PluginMetadata;

/// How serious a [`ParseProblem`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// The entry was dropped.
    Error,
    /// The entry was kept; something in it was ignored or defaulted.
    Warning,
}

/// A diagnostic attached to one descriptor entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseProblem {
    /// Position of the entry within its file.
    pub index: usize,
    /// Plugin id of the entry, if it could be read.
    pub entry: Option<String>,
    /// Error class.
    pub kind: ErrorKind,
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable detail.
    pub detail: String,
}

impl ParseProblem {
    pub(crate) fn error(index: usize, entry: Option<&str>, err: &Error) -> Self {
        Self::new(index, entry, err, Severity::Error)
    }

    pub(crate) fn warning(index: usize, entry: Option<&str>, err: &Error) -> Self {
        Self::new(index, entry, err, Severity::Warning)
    }

    fn new(index: usize, entry: Option<&str>, err: &Error, severity: Severity) -> Self {
        Self {
            index,
            entry: entry.map(str::to_string),
            kind: err.kind(),
            severity,
            detail: err.to_string(),
        }
    }

    /// Returns true if this problem dropped its entry.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ParseProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.entry {
            Some(id) => write!(f, "{} in entry #{} ({}): {}", level, self.index, id, self.detail),
            None => write!(f, "{} in entry #{}: {}", level, self.index, self.detail),
        }
    }
}

/// Outcome of parsing one descriptor file.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParseReport {
    /// Successfully parsed plugins, in file order.
    pub plugins: Vec<PluginMetadata>,
    /// Errors and warnings, in file order.
    pub problems: Vec<ParseProblem>,
}

impl ParseReport {
    /// Problems that dropped an entry.
    pub fn errors(&self) -> impl Iterator<Item = &ParseProblem> {
        self.problems.iter().filter(|p| p.severity == Severity::Error)
    }

    /// Problems that left their entry in place.
    pub fn warnings(&self) -> impl Iterator<Item = &ParseProblem> {
        self.problems.iter().filter(|p| p.severity == Severity::Warning)
    }

    /// Returns true if any entry was dropped.
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(ParseProblem::is_error)
    }

    /// Returns true if there are no problems at all.
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    pub(crate) fn push_error(&mut self, index: usize, entry: Option<&str>, err: &Error) {
        tracing::debug!("Dropping descriptor entry #{}: {}", index, err);
        self.problems.push(ParseProblem::error(index, entry, err));
    }

    pub(crate) fn push_warning(&mut self, index: usize, entry: Option<&str>, err: &Error) {
        tracing::warn!(
            "Descriptor entry #{} ({}): {}",
            index,
            entry.unwrap_or("<unknown>"),
            err
        );
        self.problems.push(ParseProblem::warning(index, entry, err));
    }
}
