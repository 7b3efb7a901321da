//! Version values and their total ordering.
//!
//! A version is a sequence of numeric and textual components. Components are
//! separated by `.`, `-` or `+`, and a run of digits directly followed by
//! letters (or the reverse) is split into two components, so `1.0rc1` reads
//! as `1`, `0`, `rc`, `1`.
//!
//! Ordering walks both sequences position by position. A missing position
//! counts as numeric zero, a textual component sorts below any numeric one,
//! numeric components compare by value at any length, and two textual
//! components compare lexically (case-insensitive). This
//! puts pre-release qualifiers below their release: `1.0-snapshot < 1.0 <
//! 1.0.1`, and makes `1.0` equal to `1.0.0`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{Error, Result};

const SEPARATORS: [char; 3] = ['.', '-', '+'];

/// A single component of a [`Version`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionComponent {
    /// A run of digits without leading zeros; zero is `"0"`.
    Numeric(String),
    /// A run of letters, stored lowercase.
    Text(String),
}

impl VersionComponent {
    /// A numeric component from a run of ASCII digits.
    pub fn numeric(digits: &str) -> Self {
        let stripped = digits.trim_start_matches('0');
        if stripped.is_empty() {
            Self::Numeric("0".to_string())
        } else {
            Self::Numeric(stripped.to_string())
        }
    }

    fn is_zero(&self) -> bool {
        matches!(self, Self::Numeric(n) if n == "0")
    }

    /// Ordering against the implicit zero that pads a shorter version.
    fn cmp_padding(&self) -> Ordering {
        match self {
            Self::Text(_) => Ordering::Less,
            _ if self.is_zero() => Ordering::Equal,
            Self::Numeric(_) => Ordering::Greater,
        }
    }
}

impl Ord for VersionComponent {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // no leading zeros, so the longer run is the larger number
            (Self::Numeric(a), Self::Numeric(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Text(_), Self::Numeric(_)) => Ordering::Less,
            (Self::Numeric(_), Self::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for VersionComponent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A parsed, immutable version.
#[derive(Debug, Clone)]
pub struct Version {
    components: Vec<VersionComponent>,
}

impl Version {
    /// Parse a version from text. See [`parse_version`].
    pub fn parse(text: &str) -> Result<Self> {
        parse_version(text)
    }

    /// The parsed components in declaration order.
    pub fn components(&self) -> &[VersionComponent] {
        &self.components
    }

    /// Returns true if the version carries no textual qualifier.
    pub fn is_release(&self) -> bool {
        self.components
            .iter()
            .all(|c| matches!(c, VersionComponent::Numeric(_)))
    }

    /// Components with trailing zeros removed; equal versions share this form.
    fn significant(&self) -> &[VersionComponent] {
        let end = self
            .components
            .iter()
            .rposition(|c| !c.is_zero())
            .map_or(0, |i| i + 1);
        &self.components[..end]
    }
}

/// Parse a version string into a [`Version`].
///
/// Surrounding whitespace and a leading `v` before a digit are tolerated.
/// Fails with [`Error::MalformedVersion`] on empty input, empty components
/// (`1..0`, `1.`), or characters outside ASCII letters and digits.
pub fn parse_version(text: &str) -> Result<Version> {
    let trimmed = text.trim();
    let trimmed = match trimmed.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => trimmed,
    };

    if trimmed.is_empty() {
        return Err(Error::malformed_version(text, "no components"));
    }

    let mut components = Vec::new();
    for segment in trimmed.split(SEPARATORS) {
        if segment.is_empty() {
            return Err(Error::malformed_version(text, "empty component"));
        }
        split_segment(text, segment, &mut components)?;
    }

    Ok(Version { components })
}

/// Split one separator-delimited segment at digit/letter transitions.
fn split_segment(input: &str, segment: &str, out: &mut Vec<VersionComponent>) -> Result<()> {
    let mut start = 0;
    let mut numeric: Option<bool> = None;

    for (i, ch) in segment.char_indices() {
        let is_digit = if ch.is_ascii_digit() {
            true
        } else if ch.is_ascii_alphabetic() {
            false
        } else {
            return Err(Error::malformed_version(
                input,
                format!("unexpected character '{}'", ch),
            ));
        };

        match numeric {
            Some(prev) if prev != is_digit => {
                out.push(make_component(&segment[start..i], prev));
                start = i;
            }
            _ => {}
        }
        numeric = Some(is_digit);
    }

    if let Some(prev) = numeric {
        out.push(make_component(&segment[start..], prev));
    }
    Ok(())
}

fn make_component(run: &str, numeric: bool) -> VersionComponent {
    if numeric {
        VersionComponent::numeric(run)
    } else {
        VersionComponent::Text(run.to_ascii_lowercase())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            let ordering = match (self.components.get(i), other.components.get(i)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(a), None) => a.cmp_padding(),
                (None, Some(b)) => b.cmp_padding().reverse(),
                (None, None) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

/// Canonical text: numeric components joined by `.`, textual ones by `-`.
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                let sep = match component {
                    VersionComponent::Numeric(_) => '.',
                    VersionComponent::Text(_) => '-',
                };
                write!(f, "{}", sep)?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
