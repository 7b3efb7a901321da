//! # plugin-metadata
//!
//! Descriptor parsing, version ranges, and load-order resolution for
//! plugin/mod packages.
//!
//! This crate provides:
//! - **Versions** - Parse and totally order free-form version strings
//! - **Version Ranges** - Maven-style interval notation (`[1.0,2.0)`)
//! - **Legacy Descriptors** - Read `mcmod.info` JSON arrays permissively and write them back
//! - **Structured Descriptors** - Read `mods.toml` tables with full dependency clauses
//! - **Resolution** - Validate a plugin set and compute a deterministic load order
//!
//! ## Quick Start
//!
//! ```rust
//! use plugin_metadata::{parse_structured_str, resolve};
//!
//! let report = parse_structured_str(r#"
//!     [[mods]]
//!     modId = "alpha"
//!     version = "1.0.0"
//!
//!     [[mods.dependencies]]
//!     modId = "beta"
//!     versionRange = "[1.0,2.0)"
//!     ordering = "AFTER"
//!
//!     [[mods]]
//!     modId = "beta"
//!     version = "1.5"
//! "#)?;
//!
//! let result = resolve(&report.plugins);
//! assert_eq!(result.order().unwrap(), ["beta", "alpha"]);
//! # Ok::<(), plugin_metadata::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Serialize metadata and resolution results

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod error;
mod metadata;
mod parser;
mod range;
mod resolver;
mod version;

pub use error::{Error, ErrorKind, Result};
pub use metadata::{
    validate_plugin_id, DeclaredVersion, Dependency, LoadOrder, Optionality, PluginLinks,
    PluginMetadata, PluginMetadataBuilder, SourceFormat, MAX_PLUGIN_ID_LEN,
};
pub use parser::legacy::{
    parse as parse_legacy, parse_str as parse_legacy_str, to_string as write_legacy,
};
pub use parser::structured::{parse as parse_structured, parse_str as parse_structured_str};
pub use parser::{legacy, structured, ParseProblem, ParseReport, Severity};
pub use range::{contains, parse_range, Bound, VersionRange};
pub use resolver::{resolve, ResolutionProblem, ResolutionResult, Resolver, ResolverConfig};
pub use version::{parse_version, Version, VersionComponent};

/// Crate version for compatibility checks.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
