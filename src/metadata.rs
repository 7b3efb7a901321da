//! Canonical plugin metadata shared by both descriptor formats.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::range::VersionRange;
use crate::version::{parse_version, Version};

/// Maximum length of a plugin id.
pub const MAX_PLUGIN_ID_LEN: usize = 64;

/// Check that `id` is a valid plugin id.
///
/// Ids start with a lowercase ASCII letter or digit, continue with lowercase
/// letters, digits, `-` or `_`, and are at most [`MAX_PLUGIN_ID_LEN`] bytes.
pub fn validate_plugin_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_id(id, "id is empty"));
    }
    if id.len() > MAX_PLUGIN_ID_LEN {
        return Err(Error::invalid_id(
            id,
            format!("id is longer than {} characters", MAX_PLUGIN_ID_LEN),
        ));
    }
    if id.starts_with(['-', '_']) {
        return Err(Error::invalid_id(id, "id must start with a letter or digit"));
    }
    if let Some(bad) = id
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
    {
        return Err(Error::invalid_id(id, format!("unexpected character '{}'", bad)));
    }
    Ok(())
}

/// When a dependency initializes relative to the plugin declaring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum LoadOrder {
    /// The declaring plugin initializes before the dependency.
    Before,
    /// The declaring plugin initializes after the dependency.
    After,
    /// No ordering constraint.
    #[default]
    Unordered,
}

impl LoadOrder {
    /// Parse an ordering keyword, case-insensitive.
    ///
    /// `NONE` and `UNDEFINED` are accepted as spellings of [`LoadOrder::Unordered`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "BEFORE" => Some(Self::Before),
            "AFTER" => Some(Self::After),
            "UNORDERED" | "NONE" | "UNDEFINED" => Some(Self::Unordered),
            _ => None,
        }
    }
}

impl fmt::Display for LoadOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("BEFORE"),
            Self::After => f.write_str("AFTER"),
            Self::Unordered => f.write_str("UNORDERED"),
        }
    }
}

/// Whether a dependency must be present for the plugin to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Optionality {
    /// Absence or a version mismatch blocks resolution.
    #[default]
    Required,
    /// Absence is tolerated; a version mismatch is only a warning.
    Optional,
}

/// A declared relationship to another plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dependency {
    id: String,
    version_range: Option<VersionRange>,
    load_order: LoadOrder,
    optionality: Optionality,
}

impl Dependency {
    /// Create a required, unordered dependency accepting any version.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate_plugin_id(&id)?;
        Ok(Self {
            id,
            version_range: None,
            load_order: LoadOrder::Unordered,
            optionality: Optionality::Required,
        })
    }

    /// Constrain the accepted target versions.
    pub fn with_range(mut self, range: VersionRange) -> Self {
        self.version_range = Some(range);
        self
    }

    /// Set the ordering hint.
    pub fn with_load_order(mut self, order: LoadOrder) -> Self {
        self.load_order = order;
        self
    }

    /// Set the optionality.
    pub fn with_optionality(mut self, optionality: Optionality) -> Self {
        self.optionality = optionality;
        self
    }

    /// Mark the dependency optional.
    pub fn optional(self) -> Self {
        self.with_optionality(Optionality::Optional)
    }

    /// Mark the dependency required.
    pub fn required(self) -> Self {
        self.with_optionality(Optionality::Required)
    }

    /// Target plugin id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Accepted versions; `None` accepts any.
    pub fn version_range(&self) -> Option<&VersionRange> {
        self.version_range.as_ref()
    }

    /// Ordering hint relative to the declaring plugin.
    pub fn load_order(&self) -> LoadOrder {
        self.load_order
    }

    /// Required or optional.
    pub fn optionality(&self) -> Optionality {
        self.optionality
    }

    /// Returns true if this dependency is optional.
    pub fn is_optional(&self) -> bool {
        self.optionality == Optionality::Optional
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_optional() { "optional" } else { "requires" };
        match &self.version_range {
            Some(range) => write!(f, "{} {} {} ({})", kind, self.id, range, self.load_order),
            None => write!(f, "{} {} (any version, {})", kind, self.id, self.load_order),
        }
    }
}

/// Links declared by a plugin. Values are opaque URI strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PluginLinks {
    /// Project website.
    pub homepage: Option<String>,
    /// Source repository.
    pub source: Option<String>,
    /// Issue tracker.
    pub issues: Option<String>,
}

impl PluginLinks {
    /// Returns true if no link is declared.
    pub fn is_empty(&self) -> bool {
        self.homepage.is_none() && self.source.is_none() && self.issues.is_none()
    }
}

/// A plugin's own version as declared in its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredVersion {
    /// The text parsed as a [`Version`].
    Parsed {
        /// Parsed value.
        version: Version,
        /// Text as written.
        text: String,
    },
    /// The text did not parse; kept for display only.
    Unparsed(String),
}

impl DeclaredVersion {
    /// The parsed version, if the text was well-formed.
    pub fn parsed(&self) -> Option<&Version> {
        match self {
            Self::Parsed { version, .. } => Some(version),
            Self::Unparsed(_) => None,
        }
    }

    /// The version as written.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parsed { text, .. } => text,
            Self::Unparsed(text) => text,
        }
    }
}

impl fmt::Display for DeclaredVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DeclaredVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Descriptor format a [`PluginMetadata`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SourceFormat {
    /// Legacy JSON array descriptor (`mcmod.info`).
    Legacy,
    /// Structured TOML descriptor (`mods.toml`).
    Structured,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Structured => f.write_str("structured"),
        }
    }
}

/// Canonical, immutable plugin metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PluginMetadata {
    id: String,
    name: String,
    version: Option<DeclaredVersion>,
    description: String,
    dependencies: Vec<Dependency>,
    links: PluginLinks,
    contributors: Vec<String>,
    entrypoint: Option<String>,
    loader: Option<String>,
    license: Option<String>,
    format: SourceFormat,
    extra: BTreeMap<String, serde_json::Value>,
}

impl PluginMetadata {
    /// Start building metadata for `id`.
    pub fn builder(id: impl Into<String>, format: SourceFormat) -> PluginMetadataBuilder {
        PluginMetadataBuilder::new(id, format)
    }

    /// Unique plugin id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name; falls back to the id.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared version, if any.
    pub fn version(&self) -> Option<&DeclaredVersion> {
        self.version.as_ref()
    }

    /// Parsed version, if declared and well-formed.
    pub fn parsed_version(&self) -> Option<&Version> {
        self.version.as_ref().and_then(DeclaredVersion::parsed)
    }

    /// Description; empty if not declared.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Declared dependencies, at most one per target.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Look up the dependency on `id`.
    pub fn dependency(&self, id: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.id == id)
    }

    /// Declared links.
    pub fn links(&self) -> &PluginLinks {
        &self.links
    }

    /// Authors and contributors.
    pub fn contributors(&self) -> &[String] {
        &self.contributors
    }

    /// Format-specific entry point, opaque to this crate.
    pub fn entrypoint(&self) -> Option<&str> {
        self.entrypoint.as_deref()
    }

    /// Name of the loader that instantiates this plugin.
    pub fn loader(&self) -> Option<&str> {
        self.loader.as_deref()
    }

    /// License identifier or text.
    pub fn license(&self) -> Option<&str> {
        self.license.as_deref()
    }

    /// Which descriptor format produced this metadata.
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Descriptor keys the parser did not interpret, as JSON values.
    pub fn extra(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.extra
    }

    /// Serialize to pretty JSON for diagnostics.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Builder for [`PluginMetadata`].
#[derive(Debug, Clone)]
pub struct PluginMetadataBuilder {
    id: String,
    format: SourceFormat,
    name: Option<String>,
    version: Option<String>,
    lenient_version: bool,
    description: Option<String>,
    dependencies: Vec<Dependency>,
    links: PluginLinks,
    contributors: Vec<String>,
    entrypoint: Option<String>,
    loader: Option<String>,
    license: Option<String>,
    extra: BTreeMap<String, serde_json::Value>,
}

impl PluginMetadataBuilder {
    /// Create a new builder.
    pub fn new(id: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            id: id.into(),
            format,
            name: None,
            version: None,
            lenient_version: false,
            description: None,
            dependencies: Vec::new(),
            links: PluginLinks::default(),
            contributors: Vec::new(),
            entrypoint: None,
            loader: None,
            license: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the version text; [`build`](Self::build) fails if it does not parse.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self.lenient_version = false;
        self
    }

    /// Set the version text, keeping it unparsed if it is malformed.
    pub fn lenient_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self.lenient_version = true;
        self
    }

    /// Set the description.
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add a dependency.
    pub fn dependency(mut self, dep: Dependency) -> Self {
        self.dependencies.push(dep);
        self
    }

    /// Add dependencies.
    pub fn dependencies<I>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = Dependency>,
    {
        self.dependencies.extend(deps);
        self
    }

    /// Set the links.
    pub fn links(mut self, links: PluginLinks) -> Self {
        self.links = links;
        self
    }

    /// Set the homepage link.
    pub fn homepage(mut self, url: impl Into<String>) -> Self {
        self.links.homepage = Some(url.into());
        self
    }

    /// Add a contributor.
    pub fn contributor(mut self, name: impl Into<String>) -> Self {
        self.contributors.push(name.into());
        self
    }

    /// Add contributors.
    pub fn contributors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contributors.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the entry point.
    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Set the loader name.
    pub fn loader(mut self, loader: impl Into<String>) -> Self {
        self.loader = Some(loader.into());
        self
    }

    /// Set the license.
    pub fn license(mut self, license: impl Into<String>) -> Self {
        self.license = Some(license.into());
        self
    }

    /// Keep an uninterpreted descriptor key; a later value for the same key wins.
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Validate and build.
    ///
    /// Fails if the id is invalid, a strict version does not parse, or two
    /// dependencies share a target.
    pub fn build(self) -> Result<PluginMetadata> {
        validate_plugin_id(&self.id)?;

        for (i, dep) in self.dependencies.iter().enumerate() {
            if self.dependencies[..i].iter().any(|d| d.id == dep.id) {
                return Err(Error::DuplicateDependency(dep.id.clone()));
            }
        }

        let version = match self.version {
            None => None,
            Some(text) => match parse_version(&text) {
                Ok(version) => Some(DeclaredVersion::Parsed { version, text }),
                Err(_) if self.lenient_version => Some(DeclaredVersion::Unparsed(text)),
                Err(e) => return Err(e),
            },
        };

        Ok(PluginMetadata {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            version,
            description: self.description.unwrap_or_default(),
            dependencies: self.dependencies,
            links: self.links,
            contributors: self.contributors,
            entrypoint: self.entrypoint,
            loader: self.loader,
            license: self.license,
            format: self.format,
            extra: self.extra,
        })
    }
}
