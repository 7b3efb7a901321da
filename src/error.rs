//! Error types for descriptor parsing and metadata validation.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing versions, ranges and descriptor entries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Version text does not follow the version grammar.
    #[error("malformed version '{input}': {reason}")]
    MalformedVersion {
        /// Offending text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Range text does not follow the interval notation or is empty.
    #[error("malformed version range '{input}': {reason}")]
    MalformedRange {
        /// Offending text.
        input: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A required descriptor field is absent.
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    /// A plugin id does not match the id syntax.
    #[error("invalid plugin id '{id}': {reason}")]
    InvalidPluginId {
        /// Offending id.
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A descriptor field has the wrong value type.
    #[error("invalid value for field '{field}': expected {expected}")]
    InvalidField {
        /// Field name.
        field: String,
        /// Expected value shape.
        expected: String,
    },

    /// The same dependency target is declared twice in one entry.
    #[error("duplicate dependency on '{0}'")]
    DuplicateDependency(String),

    /// Metadata cannot be expressed in the requested descriptor format.
    #[error("plugin '{plugin}' cannot be written in this format: {reason}")]
    Unrepresentable {
        /// Plugin id.
        plugin: String,
        /// What the format lacks.
        reason: String,
    },

    /// Raw descriptor text could not be decoded into a value tree.
    #[error("descriptor decode error: {0}")]
    Decode(String),
}

/// Discriminant of [`Error`], used in per-entry parse reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorKind {
    /// See [`Error::MalformedVersion`].
    MalformedVersion,
    /// See [`Error::MalformedRange`].
    MalformedRange,
    /// See [`Error::MissingRequiredField`].
    MissingRequiredField,
    /// See [`Error::InvalidPluginId`].
    InvalidPluginId,
    /// See [`Error::InvalidField`].
    InvalidField,
    /// See [`Error::DuplicateDependency`].
    DuplicateDependency,
    /// See [`Error::Unrepresentable`].
    Unrepresentable,
    /// See [`Error::Decode`].
    Decode,
}

impl Error {
    /// Create a malformed version error.
    pub fn malformed_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed range error.
    pub fn malformed_range(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRange {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField(field.into())
    }

    /// Create an invalid plugin id error.
    pub fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPluginId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Create an unrepresentable metadata error.
    pub fn unrepresentable(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unrepresentable {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Returns the discriminant of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedVersion { .. } => ErrorKind::MalformedVersion,
            Self::MalformedRange { .. } => ErrorKind::MalformedRange,
            Self::MissingRequiredField(_) => ErrorKind::MissingRequiredField,
            Self::InvalidPluginId { .. } => ErrorKind::InvalidPluginId,
            Self::InvalidField { .. } => ErrorKind::InvalidField,
            Self::DuplicateDependency(_) => ErrorKind::DuplicateDependency,
            Self::Unrepresentable { .. } => ErrorKind::Unrepresentable,
            Self::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Returns true if this error only fails the entry or clause that raised it.
    ///
    /// Decode and write failures affect a whole file instead.
    pub fn is_entry_local(&self) -> bool {
        !matches!(self, Self::Decode(_) | Self::Unrepresentable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_field("modid");
        assert_eq!(err.to_string(), "missing required field: modid");

        let err = Error::malformed_range("[2.0,1.0]", "lower bound exceeds upper bound");
        assert!(err.to_string().contains("[2.0,1.0]"));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_error_classification() {
        assert_eq!(
            Error::malformed_version("", "empty").kind(),
            ErrorKind::MalformedVersion
        );
        assert!(Error::missing_field("version").is_entry_local());
        assert!(!Error::decode("unexpected eof").is_entry_local());
        assert!(Error::DuplicateDependency("beta".into()).is_entry_local());
    }
}
