//! Interval version constraints in Maven range notation.
//!
//! | Range          | Meaning                  |
//! |----------------|--------------------------|
//! | `1.0`          | x >= 1.0                 |
//! | `[1.0]`        | x == 1.0                 |
//! | `[1.0,)`       | x >= 1.0                 |
//! | `(1.0,)`       | x > 1.0                  |
//! | `(,1.0]`       | x <= 1.0                 |
//! | `[1.0,2.0)`    | 1.0 <= x < 2.0           |
//!
//! Multi-interval unions (`[1,2),[3,4)`) are not supported.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::version::{parse_version, Version};

/// One side of a [`VersionRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bound {
    /// The bounding version.
    pub version: Version,
    /// Whether the bounding version itself is accepted.
    pub inclusive: bool,
}

impl Bound {
    /// Create an inclusive bound.
    pub fn inclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: true,
        }
    }

    /// Create an exclusive bound.
    pub fn exclusive(version: Version) -> Self {
        Self {
            version,
            inclusive: false,
        }
    }
}

/// A validated, non-empty interval over [`Version`].
///
/// The text the range was parsed from is kept for diagnostics; equality
/// only looks at the bounds.
#[derive(Debug, Clone)]
pub struct VersionRange {
    lower: Option<Bound>,
    upper: Option<Bound>,
    text: String,
}

impl VersionRange {
    /// Parse a range from text. See [`parse_range`].
    pub fn parse(text: &str) -> Result<Self> {
        parse_range(text)
    }

    /// Build a range from explicit bounds, checking it is non-empty.
    pub fn from_bounds(lower: Option<Bound>, upper: Option<Bound>) -> Result<Self> {
        let text = render(lower.as_ref(), upper.as_ref());
        check_non_empty(&text, lower.as_ref(), upper.as_ref())?;
        Ok(Self { lower, upper, text })
    }

    /// The lower bound, if constrained.
    pub fn lower(&self) -> Option<&Bound> {
        self.lower.as_ref()
    }

    /// The upper bound, if constrained.
    pub fn upper(&self) -> Option<&Bound> {
        self.upper.as_ref()
    }

    /// The range as it was written.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if the range admits exactly one version.
    pub fn is_pinned(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) => lo.version == hi.version,
            _ => false,
        }
    }

    /// Check whether `version` lies within this range.
    pub fn contains(&self, version: &Version) -> bool {
        contains(self, version)
    }
}

/// Parse range text into a [`VersionRange`].
///
/// Fails with [`Error::MalformedRange`] on mismatched brackets, bounds that
/// are not valid versions, more than one comma, or an empty interval.
pub fn parse_range(text: &str) -> Result<VersionRange> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::malformed_range(text, "empty range"));
    }

    let mut chars = trimmed.chars();
    let open = chars.next();
    let close = chars.next_back();

    let lower_inclusive = match open {
        Some('[') => true,
        Some('(') => false,
        _ => {
            if trimmed.contains(['[', ']', '(', ')', ',']) {
                return Err(Error::malformed_range(text, "mismatched brackets"));
            }
            // a bare version is a minimum
            let version = bound_version(text, trimmed)?;
            return Ok(VersionRange {
                lower: Some(Bound::inclusive(version)),
                upper: None,
                text: trimmed.to_string(),
            });
        }
    };

    let upper_inclusive = match close {
        Some(']') => true,
        Some(')') => false,
        _ => return Err(Error::malformed_range(text, "mismatched brackets")),
    };

    let inner = &trimmed[1..trimmed.len() - 1];
    if inner.contains(['[', ']', '(', ')']) {
        return Err(Error::malformed_range(text, "mismatched brackets"));
    }

    let (lower, upper) = match inner.split_once(',') {
        Some((low, high)) => {
            if high.contains(',') {
                return Err(Error::malformed_range(text, "multiple intervals are not supported"));
            }
            let lower = optional_bound(text, low, lower_inclusive)?;
            let upper = optional_bound(text, high, upper_inclusive)?;
            (lower, upper)
        }
        None => {
            if !(lower_inclusive && upper_inclusive) {
                return Err(Error::malformed_range(
                    text,
                    "a single version must use inclusive brackets",
                ));
            }
            let version = bound_version(text, inner)?;
            (
                Some(Bound::inclusive(version.clone())),
                Some(Bound::inclusive(version)),
            )
        }
    };

    check_non_empty(text, lower.as_ref(), upper.as_ref())?;

    Ok(VersionRange {
        lower,
        upper,
        text: trimmed.to_string(),
    })
}

/// Check `version` against both bounds of `range`; unbounded sides always pass.
pub fn contains(range: &VersionRange, version: &Version) -> bool {
    let above_lower = range.lower.as_ref().map_or(true, |b| match version.cmp(&b.version) {
        Ordering::Greater => true,
        Ordering::Equal => b.inclusive,
        Ordering::Less => false,
    });
    let below_upper = range.upper.as_ref().map_or(true, |b| match version.cmp(&b.version) {
        Ordering::Less => true,
        Ordering::Equal => b.inclusive,
        Ordering::Greater => false,
    });
    above_lower && below_upper
}

fn optional_bound(input: &str, side: &str, inclusive: bool) -> Result<Option<Bound>> {
    let side = side.trim();
    if side.is_empty() {
        return Ok(None);
    }
    let version = bound_version(input, side)?;
    Ok(Some(Bound { version, inclusive }))
}

fn bound_version(input: &str, side: &str) -> Result<Version> {
    parse_version(side).map_err(|e| Error::malformed_range(input, e.to_string()))
}

fn check_non_empty(input: &str, lower: Option<&Bound>, upper: Option<&Bound>) -> Result<()> {
    if let (Some(lo), Some(hi)) = (lower, upper) {
        match lo.version.cmp(&hi.version) {
            Ordering::Greater => {
                return Err(Error::malformed_range(input, "lower bound exceeds upper bound"));
            }
            Ordering::Equal if !(lo.inclusive && hi.inclusive) => {
                return Err(Error::malformed_range(input, "interval is empty"));
            }
            _ => {}
        }
    }
    Ok(())
}

fn render(lower: Option<&Bound>, upper: Option<&Bound>) -> String {
    let open = if lower.map_or(false, |b| b.inclusive) { '[' } else { '(' };
    let close = if upper.map_or(false, |b| b.inclusive) { ']' } else { ')' };
    let low = lower.map(|b| b.version.to_string()).unwrap_or_default();
    let high = upper.map(|b| b.version.to_string()).unwrap_or_default();
    format!("{}{},{}{}", open, low, high, close)
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower && self.upper == other.upper
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for VersionRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for VersionRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
