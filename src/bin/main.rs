//! semforge CLI - Compile entity-catalog selections into TMDL
//!
//! Usage:
//!   semforge generate --input <model.json> --out <dir> [--config <semforge.toml>] [--dry-run] [--force]
//!   semforge filter <view.xml> [--utc-offset <hours>] [--alias <alias>]
//!
//! Examples:
//!   semforge generate --input sales.json --out SalesModel.SemanticModel
//!   semforge filter active_accounts.xml --utc-offset -5

use clap::{Parser, Subcommand};
use semforge::analyze::{has_destructive, SemanticModelChange};
use semforge::config::Settings;
use semforge::filter::{FilterConverter, FilterEnvironment};
use semforge::model::GeneratedDefinitionSet;
use semforge::preserve::is_generated_definition;
use semforge::regenerate::{regenerate, ModelInput};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "semforge")]
#[command(about = "semforge - Compile entity-catalog schemas and view filters into TMDL semantic models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate (or regenerate) a TMDL definition folder
    Generate {
        /// JSON file with tables, relationships and date settings
        #[arg(short, long)]
        input: PathBuf,

        /// Settings file (defaults to semforge.toml discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Semantic model folder; prior definitions are read from here
        #[arg(short, long)]
        out: PathBuf,

        /// Print the change list without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Write even when the change list contains destructive changes
        #[arg(long)]
        force: bool,
    },

    /// Convert a FetchXML view filter into a SQL WHERE clause
    Filter {
        /// Path to the FetchXML file
        file: PathBuf,

        /// Local-calendar offset from UTC in hours
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        utc_offset: f64,

        /// Alias of the filtered table
        #[arg(long, default_value = "Base")]
        alias: String,

        /// Target the Fabric Link endpoint (no current-user context)
        #[arg(long)]
        fabric_link: bool,

        /// Target import storage mode (no current-user context)
        #[arg(long)]
        import_mode: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            input,
            config,
            out,
            dry_run,
            force,
        } => cmd_generate(input, config, out, dry_run, force),
        Commands::Filter {
            file,
            utc_offset,
            alias,
            fabric_link,
            import_mode,
        } => cmd_filter(
            file,
            utc_offset,
            &alias,
            FilterEnvironment {
                fabric_link,
                import_mode,
            },
        ),
    }
}

fn cmd_generate(
    input: PathBuf,
    config: Option<PathBuf>,
    out: PathBuf,
    dry_run: bool,
    force: bool,
) -> ExitCode {
    let settings = match config {
        Some(path) => Settings::from_file(path),
        None => Settings::discover(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let options = match settings.generate_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut model: ModelInput = match serde_json::from_str(&source) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Invalid model input '{}': {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if model.date.is_none() {
        model.date = settings.date.clone();
    }

    let prior = match read_definitions(&out) {
        Ok(set) => set,
        Err(e) => {
            eprintln!("Error reading '{}': {}", out.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let prior = (!prior.is_empty()).then_some(prior);

    let result = match regenerate(&model, prior.as_ref(), &options, &settings.analysis_config()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Generation error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_changes(&result.changes);

    if dry_run {
        return ExitCode::SUCCESS;
    }
    if has_destructive(&result.changes) && !force {
        eprintln!("Destructive changes detected; re-run with --force to apply");
        return ExitCode::FAILURE;
    }

    if let Err(e) = write_definitions(&out, &result.definitions, prior.as_ref()) {
        eprintln!("Error writing '{}': {}", out.display(), e);
        return ExitCode::FAILURE;
    }
    println!("Wrote {} files to {}", result.definitions.len(), out.display());
    ExitCode::SUCCESS
}

fn cmd_filter(file: PathBuf, utc_offset: f64, alias: &str, env: FilterEnvironment) -> ExitCode {
    let xml = match fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let result = FilterConverter::new(utc_offset)
        .with_environment(env)
        .convert(&xml, alias);

    for line in &result.debug_log {
        tracing::debug!("{}", line);
    }
    println!("{}", result.sql_where_clause);
    if !result.is_fully_supported {
        eprintln!("Partially supported:");
        for feature in &result.unsupported_features {
            eprintln!("  - {}", feature);
        }
    }
    ExitCode::SUCCESS
}

fn print_changes(changes: &[SemanticModelChange]) {
    if changes.is_empty() {
        println!("No changes.");
        return;
    }
    println!("Changes:");
    for change in changes {
        println!("  {}", change);
    }
}

/// Load every `.tmdl` file under `root`, keyed by `/`-separated relative path.
fn read_definitions(root: &Path) -> io::Result<GeneratedDefinitionSet> {
    let mut set = GeneratedDefinitionSet::new();
    if root.is_dir() {
        collect_tmdl(root, root, &mut set)?;
    }
    Ok(set)
}

fn collect_tmdl(root: &Path, dir: &Path, set: &mut GeneratedDefinitionSet) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_tmdl(root, &path, set)?;
        } else if path.extension().is_some_and(|ext| ext == "tmdl") {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            set.insert(key, fs::read_to_string(&path)?);
        }
    }
    Ok(())
}

fn write_definitions(
    root: &Path,
    set: &GeneratedDefinitionSet,
    prior: Option<&GeneratedDefinitionSet>,
) -> io::Result<()> {
    // Generated definitions the new set no longer produces (removed or
    // renamed tables). Files the user or the modelling tool wrote stay.
    for (stale, text) in prior.into_iter().flat_map(|p| p.iter()) {
        if set.contains(stale) {
            continue;
        }
        if is_generated_definition(stale, text) {
            tracing::info!(path = %stale, "removing stale definition");
            fs::remove_file(root.join(stale))?;
        } else {
            tracing::debug!(path = %stale, "leaving user definition in place");
        }
    }
    for (relative, text) in set.iter() {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
    }
    Ok(())
}
