//! Example parsing one descriptor of each format and resolving the load order.

use plugin_metadata::{
    parse_legacy_str, parse_structured_str, ParseReport, ResolutionResult, Resolver,
    ResolverConfig,
};

const MCMOD_INFO: &str = r#"[
    {
        "modid": "corelib",
        "name": "Core Library",
        "version": "2.4.1",
        "authorList": ["Core Team"]
    },
    {
        "modid": "oldaddon",
        "version": "${version}",
        "requiredMods": ["corelib@2.4"]
    }
]"#;

const MODS_TOML: &str = r#"
modLoader = "javafml"
license = "MIT"

[[mods]]
modId = "shinymod"
version = "1.3.0"
displayName = "Shiny Mod"
authors = ["someone", "someone else"]

[[mods.dependencies]]
modId = "corelib"
versionRange = "[2.0,3.0)"
ordering = "AFTER"
mandatory = true

[[mods.dependencies]]
modId = "oldaddon"
versionRange = "[1.0,)"
ordering = "AFTER"
mandatory = false

[[mods.dependencies]]
modId = "missingextra"
ordering = "BEFORE"
mandatory = false
"#;

fn print_report(source: &str, report: &ParseReport) {
    println!("{}: {} plugins", source, report.plugins.len());
    for meta in &report.plugins {
        let version = meta.version().map(|v| v.as_str()).unwrap_or("<none>");
        println!("  {} {} ({} dependencies)", meta.id(), version, meta.dependencies().len());
    }
    for problem in &report.problems {
        println!("  {}", problem);
    }
}

fn print_result(result: &ResolutionResult) {
    match result {
        ResolutionResult::Success { order, .. } => println!("Load order: {}", order.join(" -> ")),
        ResolutionResult::Failure { problems, .. } => {
            println!("Resolution failed:");
            for problem in problems {
                println!("  {}", problem);
            }
        }
    }
    for warning in result.warnings() {
        println!("  warning: {}", warning);
    }
}

fn main() -> plugin_metadata::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("=== Parsing Descriptors ===\n");

    let legacy = parse_legacy_str(MCMOD_INFO)?;
    print_report("mcmod.info", &legacy);

    let structured = parse_structured_str(MODS_TOML)?;
    print_report("mods.toml", &structured);

    let plugins: Vec<_> = legacy
        .plugins
        .into_iter()
        .chain(structured.plugins)
        .collect();

    println!("\n=== Default Resolution ===");
    let result = Resolver::default().resolve(&plugins);
    print_result(&result);

    println!("\n=== Strict Resolution ===");
    let strict = Resolver::new(ResolverConfig::new().with_strict_unparsed_versions(true));
    print_result(&strict.resolve(&plugins));

    #[cfg(feature = "serde")]
    if let Some(shiny) = plugins.iter().find(|p| p.id() == "shinymod") {
        println!("\n=== Metadata Dump ===");
        println!("{}", shiny.to_json().unwrap_or_default());
    }

    Ok(())
}
