//! Parses measurement strings, from the command line or a manifest's
//! `entity_value` column.

use std::path::PathBuf;

use product_prep::config;
use product_prep::logging::{self, LogOutput};
use product_prep::manifest::Manifest;
use product_prep::units::{Measurement, UnitParseError, UnitParser};

#[derive(Default)]
struct CliArgs {
    entity: Option<String>,
    config: Option<PathBuf>,
    manifest: Option<PathBuf>,
    list_units: bool,
    values: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(args) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init_with(LogOutput::ConsoleOnly) {
        eprintln!("Logging disabled: {err}");
    }
    let loaded = match args.config.as_deref() {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    };
    let parser = loaded.map_err(|err| err.to_string())?.units.build_parser();

    if args.list_units {
        list_units(&parser);
        return Ok(());
    }

    let failures = match args.manifest.as_deref() {
        Some(path) => {
            let manifest = Manifest::from_csv_path(path).map_err(|err| err.to_string())?;
            parse_manifest(&parser, &manifest)
        }
        None => parse_values(&parser, args.entity.as_deref(), &args.values),
    };
    if failures > 0 {
        return Err(format!("{failures} value(s) failed to parse"));
    }
    Ok(())
}

fn parse_values(parser: &UnitParser, entity: Option<&str>, values: &[String]) -> usize {
    let mut failures = 0;
    for value in values {
        let parsed = match entity {
            Some(entity) => parser.parse_for_entity(entity, Some(value)),
            None => parser.parse(Some(value)),
        };
        if !report(value, parsed) {
            failures += 1;
        }
    }
    failures
}

fn parse_manifest(parser: &UnitParser, manifest: &Manifest) -> usize {
    let mut failures = 0;
    for row in manifest.indexed_rows() {
        let Some(value) = row.entity_value.as_deref() else {
            continue;
        };
        let parsed = parser.parse_for_entity(&row.entity_name, Some(value));
        let label = format!("{}\t{}\t{value}", row.index, row.entity_name);
        if !report(&label, parsed) {
            failures += 1;
        }
    }
    tracing::info!("Parsed manifest entity values with {failures} failure(s)");
    failures
}

fn list_units(parser: &UnitParser) {
    for entity in parser.entities().entities() {
        if let Some(units) = parser.entities().units_for(entity) {
            println!("{entity}\t{}", units.to_vec().join(", "));
        }
    }
    println!("allowed\t{}", parser.allowed_units().to_vec().join(", "));
}

fn report(label: &str, parsed: Result<Option<Measurement>, UnitParseError>) -> bool {
    match parsed {
        Ok(Some(measurement)) => {
            println!("{label}\t{measurement}");
            true
        }
        Ok(None) => {
            println!("{label}\t");
            true
        }
        Err(err) => {
            eprintln!("{label}\terror: {err}");
            false
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliArgs>, String> {
    let mut parsed = CliArgs::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--entity" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--entity requires a value".to_string())?;
                parsed.entity = Some(value.clone());
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--manifest" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--manifest requires a value".to_string())?;
                parsed.manifest = Some(PathBuf::from(value));
            }
            "--list-units" => parsed.list_units = true,
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            value => parsed.values.push(value.to_string()),
        }
        idx += 1;
    }

    if !parsed.list_units && parsed.manifest.is_none() && parsed.values.is_empty() {
        return Err(format!("Nothing to parse\n\n{}", help_text()));
    }
    Ok(Some(parsed))
}

fn help_text() -> String {
    [
        "product-prep-parse",
        "",
        "Parses \"<number> <unit>\" strings into a value and canonical unit.",
        "",
        "Usage:",
        "  product-prep-parse [--entity <name>] [--config <toml>] <text>...",
        "  product-prep-parse --manifest <csv> [--config <toml>]",
        "  product-prep-parse --list-units [--config <toml>]",
        "",
        "Options:",
        "  --entity <name>   Also require the unit to belong to this entity.",
        "  --manifest <csv>  Parse the entity_value column against each row's entity_name.",
        "  --list-units      Print each entity's units and the accepted set.",
        "  --config <toml>   Config file (defaults to the app config.toml).",
    ]
    .join("\n")
}
