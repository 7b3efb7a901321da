//! Parser for the legacy `mcmod.info` descriptor.
//!
//! The file is a JSON array of flat objects:
//!
//! ```json
//! [{
//!   "modid": "examplemod",
//!   "name": "Example Mod",
//!   "version": "1.0-SNAPSHOT",
//!   "description": "...",
//!   "url": "https://example.com",
//!   "authorList": ["someone"],
//!   "requiredMods": ["othermod@1.2"],
//!   "dependencies": ["othermod"]
//! }]
//! ```
//!
//! The format predates strict versioning, so it is read permissively: a
//! version that does not parse is kept as display text, optional fields of
//! the wrong type are ignored, and dependency lists carry neither ranges nor
//! ordering. Every listed dependency becomes required and unordered. Keys
//! this parser does not interpret are kept in [`PluginMetadata::extra`].
//!
//! [`to_string`] writes metadata back out in the same shape.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::metadata::{validate_plugin_id, Dependency, LoadOrder, PluginMetadata, SourceFormat};
use crate::parser::ParseReport;
use crate::version::parse_version;

const ID_KEY: &str = "modid";
const VERSION_KEY: &str = "version";
const DEPENDENCY_KEYS: [&str; 2] = ["requiredMods", "dependencies"];
const REQUIRED_KEY: &str = "requiredMods";
const KNOWN_KEYS: [&str; 8] = [
    ID_KEY,
    "name",
    VERSION_KEY,
    "description",
    "url",
    "authorList",
    REQUIRED_KEY,
    "dependencies",
];

/// Separates a dependency id from its redundant version suffix.
const VERSION_SEPARATOR: char = '@';

/// Parse `mcmod.info` text.
///
/// Fails only if the text is not JSON or its root is unusable; per-entry
/// problems are reported in the returned [`ParseReport`].
pub fn parse_str(text: &str) -> Result<ParseReport> {
    let root: Value = serde_json::from_str(text).map_err(|e| Error::decode(e.to_string()))?;
    parse(&root)
}

/// Parse a decoded `mcmod.info` tree.
///
/// The root is normally an array of entries. A `{"modList": [...]}` wrapper
/// and a bare single entry object are also accepted.
pub fn parse(root: &Value) -> Result<ParseReport> {
    let entries: Vec<&Value> = match root {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match obj.get("modList") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => return Err(Error::decode("'modList' must be an array")),
            None => vec![root],
        },
        _ => return Err(Error::decode("descriptor root must be an array of objects")),
    };

    let mut report = ParseReport::default();
    for (index, entry) in entries.into_iter().enumerate() {
        if let Some(meta) = parse_entry(index, entry, &mut report) {
            tracing::debug!("Parsed legacy descriptor entry {}", meta.id());
            report.plugins.push(meta);
        }
    }
    Ok(report)
}

fn parse_entry(index: usize, value: &Value, report: &mut ParseReport) -> Option<PluginMetadata> {
    let Some(obj) = value.as_object() else {
        report.push_error(index, None, &Error::invalid_field("entry", "object"));
        return None;
    };

    let id = match obj.get(ID_KEY) {
        None | Some(Value::Null) => {
            report.push_error(index, None, &Error::missing_field(ID_KEY));
            return None;
        }
        Some(Value::String(id)) => id.trim(),
        Some(_) => {
            report.push_error(index, None, &Error::invalid_field(ID_KEY, "string"));
            return None;
        }
    };
    if let Err(e) = validate_plugin_id(id) {
        report.push_error(index, Some(id), &e);
        return None;
    }

    let mut fields = EntryFields {
        obj,
        index,
        id,
        report: &mut *report,
    };
    let mut builder = PluginMetadata::builder(id, SourceFormat::Legacy);

    if let Some(name) = fields.text("name").filter(|n| !n.trim().is_empty()) {
        builder = builder.name(name);
    }

    match fields.text(VERSION_KEY) {
        Some(version) => {
            if let Err(e) = parse_version(&version) {
                fields.warn(&e);
            }
            builder = builder.lenient_version(version);
        }
        None => fields.warn(&Error::missing_field(VERSION_KEY)),
    }

    if let Some(description) = fields.text("description") {
        builder = builder.description(description);
    }
    if let Some(url) = fields.text("url").filter(|u| !u.trim().is_empty()) {
        builder = builder.homepage(url);
    }
    builder = builder.contributors(fields.list("authorList"));

    let mut dependencies: Vec<Dependency> = Vec::new();
    for key in DEPENDENCY_KEYS {
        for reference in fields.list(key) {
            let target = reference
                .split(VERSION_SEPARATOR)
                .next()
                .unwrap_or_default()
                .trim();
            if dependencies.iter().any(|d| d.id() == target) {
                continue;
            }
            match Dependency::new(target) {
                Ok(dep) => dependencies.push(dep),
                Err(e) => fields.warn(&e),
            }
        }
    }
    builder = builder.dependencies(dependencies);

    for (key, value) in obj {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            builder = builder.extra(key.clone(), value.clone());
        }
    }

    match builder.build() {
        Ok(meta) => Some(meta),
        Err(e) => {
            report.push_error(index, Some(id), &e);
            None
        }
    }
}

/// Render plugins as `mcmod.info` text.
///
/// Dependencies are written to `requiredMods`, as `id@range` when ranged.
/// Fields the format has no key for (license, loader, entry point, source and
/// issue links) are not written. Uninterpreted keys are written back as read.
///
/// Fails with [`Error::Unrepresentable`] for an optional or ordered
/// dependency, since every listed id reads back as required and unordered.
pub fn to_string(plugins: &[PluginMetadata]) -> Result<String> {
    Ok(format!("{:#}", to_value(plugins)?))
}

/// Render plugins as a `mcmod.info` JSON tree. See [`to_string`].
pub fn to_value(plugins: &[PluginMetadata]) -> Result<Value> {
    plugins
        .iter()
        .map(entry_value)
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn entry_value(meta: &PluginMetadata) -> Result<Value> {
    let mut obj = Map::new();
    obj.insert(ID_KEY.into(), meta.id().into());
    obj.insert("name".into(), meta.name().into());
    if let Some(version) = meta.version() {
        obj.insert(VERSION_KEY.into(), version.as_str().into());
    }
    if !meta.description().is_empty() {
        obj.insert("description".into(), meta.description().into());
    }
    if let Some(url) = &meta.links().homepage {
        obj.insert("url".into(), url.as_str().into());
    }
    if !meta.contributors().is_empty() {
        obj.insert("authorList".into(), meta.contributors().into());
    }

    let mut required = Vec::with_capacity(meta.dependencies().len());
    for dep in meta.dependencies() {
        if dep.is_optional() {
            return Err(Error::unrepresentable(
                meta.id(),
                format!("dependency '{}' is optional", dep.id()),
            ));
        }
        if dep.load_order() != LoadOrder::Unordered {
            return Err(Error::unrepresentable(
                meta.id(),
                format!("dependency '{}' has load order {}", dep.id(), dep.load_order()),
            ));
        }
        required.push(match dep.version_range() {
            Some(range) => Value::from(format!("{}{}{}", dep.id(), VERSION_SEPARATOR, range)),
            None => Value::from(dep.id()),
        });
    }
    if !required.is_empty() {
        obj.insert(REQUIRED_KEY.into(), Value::Array(required));
    }

    for (key, value) in meta.extra() {
        obj.entry(key.clone()).or_insert_with(|| value.clone());
    }
    Ok(Value::Object(obj))
}

/// Permissive field access for one entry; type mismatches become warnings.
struct EntryFields<'a, 'r> {
    obj: &'a Map<String, Value>,
    index: usize,
    id: &'a str,
    report: &'r mut ParseReport,
}

impl EntryFields<'_, '_> {
    fn warn(&mut self, err: &Error) {
        self.report.push_warning(self.index, Some(self.id), err);
    }

    /// A string field; numbers are accepted as their JSON text.
    fn text(&mut self, key: &str) -> Option<String> {
        let obj = self.obj;
        match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => {
                self.warn(&Error::invalid_field(key, "string"));
                None
            }
        }
    }

    /// A list of strings; a single string is read as a one-element list.
    fn list(&mut self, key: &str) -> Vec<String> {
        let obj = self.obj;
        match obj.get(key) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(s) => out.push(s.to_string()),
                        None => self.warn(&Error::invalid_field(key, "array of strings")),
                    }
                }
                out
            }
            Some(_) => {
                self.warn(&Error::invalid_field(key, "array of strings"));
                Vec::new()
            }
        }
    }
}
