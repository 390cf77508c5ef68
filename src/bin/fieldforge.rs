//! fieldforge CLI - inspect model definitions, validation rules and static LOVs
//!
//! Reads `fieldforge.yaml`, applies `FIELDFORGE_*` overrides and prints JSON.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use fieldforge::{Engine, EngineConfig};

#[derive(Parser)]
#[command(name = "fieldforge")]
#[command(version, about = "Metadata-driven model definitions and extension fields", long_about = None)]
struct Cli {
    /// Path to fieldforge.yaml
    #[arg(short, long, default_value = "fieldforge.yaml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the definition of a model as JSON
    Describe {
        /// Client model name
        model: String,

        /// Resolve labels and messages for this locale
        #[arg(short, long)]
        locale: Option<String>,
    },

    /// Build every model definition and report configuration errors
    Check,

    /// List the registered client validation rules
    Rules,

    /// Print the values of a static (enumeration-backed) LOV
    Lov {
        /// Enumeration name
        name: String,

        #[arg(short, long)]
        locale: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let result = load_engine(&cli.config).and_then(|engine| match cli.command {
        Commands::Describe { model, locale } => describe(&engine, &model, locale.as_deref()),
        Commands::Check => check(&engine),
        Commands::Rules => rules(&engine),
        Commands::Lov { name, locale } => lov(&engine, &name, locale.as_deref()),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_engine(config_path: &Path) -> Result<Engine, String> {
    let config = if config_path.exists() {
        EngineConfig::from_file(config_path).map_err(|e| e.to_string())?
    } else {
        eprintln!("  ℹ {} not found, using defaults", config_path.display());
        EngineConfig::default()
    };

    let config = config.with_env_overrides().map_err(|e| e.to_string())?;
    Engine::from_config(config).map_err(|e| e.to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("Failed to encode JSON: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn describe(engine: &Engine, model: &str, locale: Option<&str>) -> Result<(), String> {
    match locale {
        Some(locale) => {
            let def = engine
                .models()
                .localized_model_def(model, locale)
                .map_err(|e| e.to_string())?;
            print_json(&def)
        }
        None => {
            let def = engine.models().model_def(model).map_err(|e| e.to_string())?;
            print_json(&*def)
        }
    }
}

fn check(engine: &Engine) -> Result<(), String> {
    let names = engine.models().model_names().map_err(|e| e.to_string())?;
    let mut failures = 0;

    for name in &names {
        match engine.models().model_def(name) {
            Ok(def) => println!("  ✓ {} ({} fields)", def.name, def.fields.len()),
            Err(e) => {
                failures += 1;
                println!("  ✗ {}: {}", name, e);
            }
        }
    }

    let points = engine.extensions().extension_points();
    if !points.is_empty() {
        println!("  ℹ Extension points:");
        for point in points {
            println!("    - {} -> {}", point.name, point.target_entity_type);
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} models failed to build", failures, names.len()));
    }

    println!("✨ {} models OK", names.len());
    Ok(())
}

fn rules(engine: &Engine) -> Result<(), String> {
    let registry = engine.validations().registry();
    for (rule, target, details) in registry.entries() {
        let cross = registry.constraint(rule).map_or(false, |c| c.cross_validation);
        println!(
            "{:<16} {:<10} {:<18} [{}]{}",
            rule,
            target.to_string(),
            details.client_name,
            details.attributes.join(", "),
            if cross { " (cross-field)" } else { "" }
        );
    }
    Ok(())
}

fn lov(engine: &Engine, name: &str, locale: Option<&str>) -> Result<(), String> {
    let values = engine
        .lovs()
        .get_enum_lov_values(name, locale)
        .map_err(|e| e.to_string())?;
    print_json(&values)
}
