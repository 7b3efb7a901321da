//! Parser for the structured `mods.toml` descriptor.
//!
//! ```toml
//! modLoader = "javafml"
//! license = "MIT"
//! issueTrackerURL = "https://example.com/issues"
//!
//! [[mods]]
//! modId = "examplemod"
//! version = "1.2.0"
//! displayName = "Example Mod"
//! authors = "someone"
//!
//! [[mods.dependencies]]
//! modId = "othermod"
//! versionRange = "[1.0,2.0)"
//! ordering = "AFTER"
//! mandatory = true
//!
//! # Forge-style keyed dependencies are read too
//! [[dependencies.examplemod]]
//! modId = "library"
//! mandatory = false
//! ```
//!
//! Plugin id and version are required and the version must parse. A
//! dependency clause that cannot be read is dropped with a warning; the
//! plugin itself survives. Unknown plugin keys are kept in
//! [`PluginMetadata::extra`]; unknown file and dependency keys are ignored.

use toml::{Table, Value};

use crate::error::{Error, Result};
use crate::metadata::{
    validate_plugin_id, Dependency, LoadOrder, Optionality, PluginLinks, PluginMetadata,
    SourceFormat,
};
use crate::parser::ParseReport;
use crate::range::parse_range;
use crate::version::parse_version;

const PLUGIN_LIST_KEYS: [&str; 2] = ["mods", "plugins"];
const ID_KEYS: [&str; 2] = ["modId", "id"];
const NAME_KEYS: [&str; 2] = ["displayName", "name"];
const RANGE_KEYS: [&str; 2] = ["versionRange", "version"];
const ORDERING_KEYS: [&str; 2] = ["ordering", "load-order"];
const ENTRYPOINT_KEYS: [&str; 2] = ["entrypoint", "main-class"];
const KNOWN_KEYS: [&str; 14] = [
    "modId",
    "id",
    "version",
    "displayName",
    "name",
    "description",
    "authors",
    "contributors",
    "displayURL",
    "links",
    "entrypoint",
    "main-class",
    "license",
    DEPENDENCIES_KEY,
];
const DEPENDENCIES_KEY: &str = "dependencies";

/// Parse `mods.toml` text.
///
/// Fails only if the text is not valid TOML; per-entry problems are
/// reported in the returned [`ParseReport`].
pub fn parse_str(text: &str) -> Result<ParseReport> {
    let root: Table = toml::from_str(text).map_err(|e| Error::decode(e.to_string()))?;
    Ok(parse(&root))
}

/// Parse a decoded `mods.toml` table.
pub fn parse(root: &Table) -> ParseReport {
    let mut report = ParseReport::default();
    let file = FileDefaults::read(root);

    let entries = match PLUGIN_LIST_KEYS.iter().find_map(|k| root.get(*k)) {
        None => return report,
        Some(Value::Array(items)) => items,
        Some(_) => {
            report.push_error(0, None, &Error::invalid_field("mods", "array of tables"));
            return report;
        }
    };

    for (index, entry) in entries.iter().enumerate() {
        if let Some(meta) = parse_entry(index, entry, &file, &mut report) {
            tracing::debug!(
                "Parsed structured descriptor entry {} ({} dependencies)",
                meta.id(),
                meta.dependencies().len()
            );
            report.plugins.push(meta);
        }
    }
    report
}

/// File-level values every plugin in the file inherits.
struct FileDefaults<'a> {
    license: Option<&'a str>,
    issues: Option<&'a str>,
    loader: Option<&'a str>,
    keyed_dependencies: Option<&'a Table>,
}

impl<'a> FileDefaults<'a> {
    fn read(root: &'a Table) -> Self {
        Self {
            license: root.get("license").and_then(Value::as_str),
            issues: root.get("issueTrackerURL").and_then(Value::as_str),
            loader: root.get("modLoader").and_then(Value::as_str),
            keyed_dependencies: root.get(DEPENDENCIES_KEY).and_then(Value::as_table),
        }
    }
}

fn parse_entry(
    index: usize,
    value: &Value,
    file: &FileDefaults<'_>,
    report: &mut ParseReport,
) -> Option<PluginMetadata> {
    let Some(table) = value.as_table() else {
        report.push_error(index, None, &Error::invalid_field("mods", "table"));
        return None;
    };

    let id = match required_str(table, &ID_KEYS) {
        Ok(id) => id.trim(),
        Err(e) => {
            report.push_error(index, None, &e);
            return None;
        }
    };
    if let Err(e) = validate_plugin_id(id) {
        report.push_error(index, Some(id), &e);
        return None;
    }

    let version = match required_str(table, &["version"]) {
        Ok(version) => version.trim(),
        Err(e) => {
            report.push_error(index, Some(id), &e);
            return None;
        }
    };
    if let Err(e) = parse_version(version) {
        report.push_error(index, Some(id), &e);
        return None;
    }

    let mut fields = EntryFields {
        table,
        index,
        id,
        report: &mut *report,
    };
    let mut builder = PluginMetadata::builder(id, SourceFormat::Structured).version(version);

    if let Some(name) = fields.text(&NAME_KEYS).filter(|n| !n.trim().is_empty()) {
        builder = builder.name(name);
    }
    if let Some(description) = fields.text(&["description"]) {
        builder = builder.description(description.trim());
    }
    builder = builder.contributors(fields.contributors());
    builder = builder.links(fields.links(file));

    if let Some(entrypoint) = fields.text(&ENTRYPOINT_KEYS) {
        builder = builder.entrypoint(entrypoint);
    }
    if let Some(loader) = file.loader {
        builder = builder.loader(loader);
    }
    if let Some(license) = fields.text(&["license"]).or(file.license.map(str::to_string)) {
        builder = builder.license(license);
    }

    let mut dependencies: Vec<Dependency> = Vec::new();
    let nested = fields.clauses(table.get(DEPENDENCIES_KEY), DEPENDENCIES_KEY);
    let keyed = fields.clauses(
        file.keyed_dependencies.and_then(|deps| deps.get(id)),
        DEPENDENCIES_KEY,
    );
    for clause in nested.into_iter().chain(keyed) {
        let Some(dep) = fields.dependency(clause) else {
            continue;
        };
        if dependencies.iter().any(|d| d.id() == dep.id()) {
            fields.warn(&Error::DuplicateDependency(dep.id().to_string()));
            continue;
        }
        dependencies.push(dep);
    }
    builder = builder.dependencies(dependencies);

    for (key, value) in table {
        if !KNOWN_KEYS.contains(&key.as_str()) {
            builder = builder.extra(key.clone(), to_json(value));
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

/// Look up the first present alias of a required string field.
fn required_str<'t>(table: &'t Table, keys: &[&str]) -> Result<&'t str> {
    match keys.iter().find_map(|k| table.get(*k)) {
        None => Err(Error::missing_field(keys[0])),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(Error::invalid_field(keys[0], "string")),
    }
}

/// Field access for one plugin table; problems in optional fields become warnings.
struct EntryFields<'a, 'r> {
    table: &'a Table,
    index: usize,
    id: &'a str,
    report: &'r mut ParseReport,
}

impl<'a> EntryFields<'a, '_> {
    fn warn(&mut self, err: &Error) {
        self.report.push_warning(self.index, Some(self.id), err);
    }

    fn text(&mut self, keys: &[&str]) -> Option<String> {
        text_in(self.table, keys).unwrap_or_else(|e| {
            self.warn(&e);
            None
        })
    }

    /// `authors` as a string or a list, plus `[[contributors]]` tables with a `name`.
    fn contributors(&mut self) -> Vec<String> {
        let table = self.table;
        let mut names = Vec::new();
        match table.get("authors") {
            None => {}
            Some(Value::String(s)) => names.push(s.clone()),
            Some(Value::Array(items)) => {
                for item in items {
                    match item.as_str() {
                        Some(s) => names.push(s.to_string()),
                        None => self.warn(&Error::invalid_field("authors", "array of strings")),
                    }
                }
            }
            Some(_) => self.warn(&Error::invalid_field("authors", "string or array")),
        }

        if let Some(contributors) = table.get("contributors") {
            let names_found = contributors.as_array().map(|items| {
                items
                    .iter()
                    .map(|c| c.get("name").and_then(Value::as_str).or(c.as_str()))
                    .collect::<Vec<_>>()
            });
            match names_found {
                Some(found) => {
                    for name in found {
                        match name {
                            Some(n) => names.push(n.to_string()),
                            None => self.warn(&Error::invalid_field("contributors", "name")),
                        }
                    }
                }
                None => self.warn(&Error::invalid_field("contributors", "array of tables")),
            }
        }
        names
    }

    fn links(&mut self, file: &FileDefaults<'_>) -> PluginLinks {
        let table = self.table;
        let mut links = PluginLinks {
            homepage: self.text(&["displayURL"]),
            source: None,
            issues: None,
        };

        match table.get("links") {
            None => {}
            Some(Value::Table(links_table)) => {
                for (key, slot) in [
                    ("homepage", &mut links.homepage),
                    ("source", &mut links.source),
                    ("issues", &mut links.issues),
                ] {
                    match text_in(links_table, &[key]) {
                        Ok(Some(url)) => *slot = Some(url),
                        Ok(None) => {}
                        Err(e) => self.warn(&e),
                    }
                }
            }
            Some(_) => self.warn(&Error::invalid_field("links", "table")),
        }

        if links.issues.is_none() {
            links.issues = file.issues.map(str::to_string);
        }
        links
    }

    /// Dependency clauses at `value`; anything but an array of tables is a warning.
    fn clauses(&mut self, value: Option<&'a Value>, key: &str) -> Vec<&'a Value> {
        match value {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => {
                self.warn(&Error::invalid_field(key, "array of tables"));
                Vec::new()
            }
        }
    }

    fn dependency(&mut self, clause: &Value) -> Option<Dependency> {
        let Some(table) = clause.as_table() else {
            self.warn(&Error::invalid_field(DEPENDENCIES_KEY, "table"));
            return None;
        };

        let dep = required_str(table, &ID_KEYS).and_then(|id| Dependency::new(id.trim()));
        let mut dep = match dep {
            Ok(dep) => dep,
            Err(e) => {
                self.warn(&e);
                return None;
            }
        };

        match text_in(table, &RANGE_KEYS) {
            Ok(Some(range)) if !is_any_version(&range) => match parse_range(&range) {
                Ok(range) => dep = dep.with_range(range),
                Err(e) => {
                    self.warn(&e);
                    return None;
                }
            },
            Ok(_) => {}
            Err(e) => {
                self.warn(&e);
                return None;
            }
        }

        match text_in(table, &ORDERING_KEYS) {
            Ok(Some(name)) => match LoadOrder::from_name(&name) {
                Some(order) => dep = dep.with_load_order(order),
                None => self.warn(&Error::invalid_field(
                    ORDERING_KEYS[0],
                    "BEFORE, AFTER or NONE",
                )),
            },
            Ok(None) => {}
            Err(e) => self.warn(&e),
        }

        let optionality = match (table.get("mandatory"), table.get("optional")) {
            (Some(Value::Boolean(true)), _) => Optionality::Required,
            (Some(Value::Boolean(false)), _) => Optionality::Optional,
            (None, Some(Value::Boolean(true))) => Optionality::Optional,
            (None, Some(Value::Boolean(false)) | None) => Optionality::Required,
            (Some(_), _) => {
                self.warn(&Error::invalid_field("mandatory", "boolean"));
                Optionality::Required
            }
            (None, Some(_)) => {
                self.warn(&Error::invalid_field("optional", "boolean"));
                Optionality::Required
            }
        };
        Some(dep.with_optionality(optionality))
    }
}

/// First present alias of an optional string field.
fn text_in(table: &Table, keys: &[&str]) -> Result<Option<String>> {
    match keys.iter().find_map(|k| table.get(*k)) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_field(keys[0], "string")),
    }
}

fn is_any_version(range: &str) -> bool {
    matches!(range.trim(), "" | "*")
}

/// Convert a TOML value for [`PluginMetadata::extra`]; datetimes become strings.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map_or(serde_json::Value::Null, serde_json::Value::Number),
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        Value::Array(items) => items.iter().map(to_json).collect(),
        Value::Table(table) => table
            .iter()
            .map(|(k, v)| (k.clone(), to_json(v)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const MODS_TOML: &str = r#"
modLoader = "javafml"
loaderVersion = "[36,)"
license = "MIT"
issueTrackerURL = "https://example.com/issues"

[[mods]]
modId = "alpha"
version = "1.0.0"
displayName = "Alpha"
description = '''
The first plugin.
'''
authors = "Ann, Bob"
displayURL = "https://example.com/alpha"
logoFile = "alpha.png"

[mods.links]
source = "https://example.com/alpha.git"

[[mods.dependencies]]
modId = "beta"
versionRange = "[1.0.0,2.0.0)"
ordering = "AFTER"
mandatory = true
side = "BOTH"

[[mods.dependencies]]
modId = "gamma"
ordering = "BEFORE"
mandatory = false

[[mods]]
modId = "beta"
version = "1.5.0"
entrypoint = "com.example.Beta"
license = "Apache-2.0"

[[dependencies.beta]]
modId = "forge"
versionRange = "*"
ordering = "NONE"
"#;

    #[test]
    fn test_parse_full_file() {
        let report = parse_str(MODS_TOML).unwrap();
        assert!(report.is_clean(), "{:?}", report.problems);
        assert_eq!(report.plugins.len(), 2);

        let alpha = &report.plugins[0];
        assert_eq!(alpha.id(), "alpha");
        assert_eq!(alpha.name(), "Alpha");
        assert_eq!(alpha.description(), "The first plugin.");
        assert_eq!(alpha.contributors(), ["Ann, Bob".to_string()]);
        assert_eq!(alpha.links().homepage.as_deref(), Some("https://example.com/alpha"));
        assert_eq!(alpha.links().source.as_deref(), Some("https://example.com/alpha.git"));
        assert_eq!(alpha.links().issues.as_deref(), Some("https://example.com/issues"));
        assert!(alpha.entrypoint().is_none());
        assert_eq!(alpha.loader(), Some("javafml"));
        assert_eq!(alpha.extra()["logoFile"], "alpha.png");
        assert_eq!(alpha.extra().len(), 1);
        assert_eq!(alpha.license(), Some("MIT"));
        assert_eq!(alpha.format(), SourceFormat::Structured);

        let beta_dep = alpha.dependency("beta").unwrap();
        assert_eq!(beta_dep.version_range().unwrap().as_str(), "[1.0.0,2.0.0)");
        assert_eq!(beta_dep.load_order(), LoadOrder::After);
        assert_eq!(beta_dep.optionality(), Optionality::Required);

        let gamma_dep = alpha.dependency("gamma").unwrap();
        assert!(gamma_dep.version_range().is_none());
        assert_eq!(gamma_dep.load_order(), LoadOrder::Before);
        assert!(gamma_dep.is_optional());

        let beta = &report.plugins[1];
        assert_eq!(beta.entrypoint(), Some("com.example.Beta"));
        assert_eq!(beta.loader(), Some("javafml"));
        assert!(beta.extra().is_empty());
        assert_eq!(beta.license(), Some("Apache-2.0"));
        let forge = beta.dependency("forge").unwrap();
        assert!(forge.version_range().is_none());
        assert_eq!(forge.load_order(), LoadOrder::Unordered);
    }

    #[test]
    fn test_dependency_defaults() {
        let report = parse_str(
            r#"
[[plugins]]
id = "alpha"
version = "1.0"

[[plugins.dependencies]]
id = "beta"
"#,
        )
        .unwrap();

        let dep = &report.plugins[0].dependencies()[0];
        assert_eq!(dep.load_order(), LoadOrder::Unordered);
        assert_eq!(dep.optionality(), Optionality::Required);
        assert!(dep.version_range().is_none());
    }

    #[test]
    fn test_required_fields() {
        let report = parse_str(
            r#"
[[mods]]
modId = "no-version"

[[mods]]
version = "1.0"

[[mods]]
modId = "bad-version"
version = "${file.jarVersion}"

[[mods]]
modId = "fine"
version = "2.0"
"#,
        )
        .unwrap();

        assert_eq!(report.plugins.len(), 1);
        assert_eq!(report.plugins[0].id(), "fine");

        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].kind, ErrorKind::MissingRequiredField);
        assert_eq!(errors[0].entry.as_deref(), Some("no-version"));
        assert_eq!(errors[1].kind, ErrorKind::MissingRequiredField);
        assert_eq!(errors[1].entry, None);
        assert_eq!(errors[2].kind, ErrorKind::MalformedVersion);
        assert_eq!(errors[2].index, 2);
    }

    #[test]
    fn test_bad_dependency_is_dropped_not_fatal() {
        let report = parse_str(
            r#"
[[mods]]
modId = "alpha"
version = "1.0"

[[mods.dependencies]]
modId = "beta"
versionRange = "[2.0,1.0]"

[[mods.dependencies]]
versionRange = "[1.0,)"

[[mods.dependencies]]
modId = "gamma"
ordering = "SIDEWAYS"

[[mods.dependencies]]
modId = "gamma"
"#,
        )
        .unwrap();

        assert!(!report.has_errors());
        let alpha = &report.plugins[0];
        assert_eq!(alpha.dependencies().len(), 1);
        assert_eq!(alpha.dependencies()[0].load_order(), LoadOrder::Unordered);

        let kinds: Vec<ErrorKind> = report.warnings().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            [
                ErrorKind::MalformedRange,
                ErrorKind::MissingRequiredField,
                ErrorKind::InvalidField,
                ErrorKind::DuplicateDependency,
            ]
        );
    }

    #[test]
    fn test_optionality_keys() {
        let report = parse_str(
            r#"
[[mods]]
modId = "alpha"
version = "1.0"
dependencies = [
    { modId = "a", mandatory = false },
    { modId = "b", optional = true },
    { modId = "c", optional = false },
    { modId = "d", mandatory = "yes" },
]
"#,
        )
        .unwrap();

        let deps = report.plugins[0].dependencies();
        assert!(deps[0].is_optional());
        assert!(deps[1].is_optional());
        assert!(!deps[2].is_optional());
        assert!(!deps[3].is_optional());
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_unknown_keys_and_empty_files() {
        let report = parse_str("modLoader = \"javafml\"\nshowAsResourcePack = false\n").unwrap();
        assert!(report.plugins.is_empty());
        assert!(report.is_clean());

        let report = parse_str("mods = \"nope\"").unwrap();
        assert!(report.has_errors());

        assert!(matches!(parse_str("[[mods]\nmodId ="), Err(Error::Decode(_))));
    }

    #[test]
    fn test_entrypoint_and_name_fallbacks() {
        let report = parse_str(
            r#"
modLoader = "javafml"

[[mods]]
modId = "alpha"
version = "1.0"
displayName = "   "
main-class = "com.example.Alpha"

[[mods]]
modId = "beta"
version = "1.0"
"#,
        )
        .unwrap();

        let alpha = &report.plugins[0];
        assert_eq!(alpha.name(), "alpha");
        assert_eq!(alpha.entrypoint(), Some("com.example.Alpha"));

        let beta = &report.plugins[1];
        assert!(beta.entrypoint().is_none());
        assert_eq!(beta.loader(), Some("javafml"));
    }

    #[test]
    fn test_extra_keys_convert_to_json() {
        let report = parse_str(
            r#"
[[mods]]
modId = "alpha"
version = "1.0"
updateJSONURL = "https://example.com/update.json"
clientSideOnly = true
weight = 2.5
released = 2024-01-01T00:00:00Z

[mods.custom]
tags = ["a", 1]
"#,
        )
        .unwrap();

        let extra = report.plugins[0].extra();
        assert_eq!(extra["updateJSONURL"], "https://example.com/update.json");
        assert_eq!(extra["clientSideOnly"], true);
        assert_eq!(extra["weight"], 2.5);
        assert_eq!(extra["released"], "2024-01-01T00:00:00Z");
        assert_eq!(extra["custom"], serde_json::json!({"tags": ["a", 1]}));
        assert!(report.is_clean());
    }

    #[test]
    fn test_contributor_tables() {
        let report = parse_str(
            r#"
[[mods]]
modId = "alpha"
version = "1.0"
authors = ["Ann", "Bob"]

[[mods.contributors]]
name = "Cy"
description = "Docs"
"#,
        )
        .unwrap();

        assert_eq!(
            report.plugins[0].contributors(),
            ["Ann".to_string(), "Bob".to_string(), "Cy".to_string()]
        );
    }
}
