// Transit Insights - CLI
// `report` prints the dashboard bundle as JSON, `inspect` checks source files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use transit_insights::{
    get_parser, load_source, FileData, FilterSelection, InsightsEngine, PipelineConfig, SourceKind,
};

#[derive(Parser, Debug)]
#[command(name = "transit-insights")]
#[command(about = "Transit pass analytics: tickets, services and validations")]
#[command(version)]
struct Cli {
    /// JSON file with extra column aliases and/or pass types
    #[arg(long, global = true, env = "TRANSIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and print the bundle as JSON
    Report {
        #[arg(long)]
        tickets: PathBuf,

        #[arg(long)]
        servicios: PathBuf,

        #[arg(long)]
        validaciones: PathBuf,

        #[arg(long, default_value = "all")]
        year: String,

        #[arg(long, default_value = "all")]
        month: String,

        #[arg(long, default_value = "all")]
        user_type: String,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Detect each file's source and print row counts plus data quality
    Inspect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_insights=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    let engine = InsightsEngine::with_config(config);

    match cli.command {
        Command::Report {
            tickets,
            servicios,
            validaciones,
            year,
            month,
            user_type,
            pretty,
        } => run_report(
            &engine,
            [
                (SourceKind::Tickets, tickets),
                (SourceKind::Servicios, servicios),
                (SourceKind::Validaciones, validaciones),
            ],
            FilterSelection::new(&year, &month, &user_type),
            pretty,
        ),
        Command::Inspect { files } => run_inspect(&engine, &files),
    }
}

fn read_records(path: &Path) -> Result<Vec<transit_insights::RawRecord>> {
    get_parser(path)?
        .parse(path)
        .with_context(|| format!("Failed to load {}", path.display()))
}

fn run_report(
    engine: &InsightsEngine,
    sources: [(SourceKind, PathBuf); 3],
    selection: FilterSelection,
    pretty: bool,
) -> Result<()> {
    let mut files = FileData::new();
    for (kind, path) in &sources {
        let records = read_records(path)?;
        info!(source = kind.code(), rows = records.len(), "Loaded");
        files.set(*kind, records);
    }

    if !files.is_complete() {
        warn!("At least one source is empty, the report will be empty");
    }

    let data = engine.process(&files, &selection);
    let json = if pretty {
        serde_json::to_string_pretty(&data)?
    } else {
        serde_json::to_string(&data)?
    };
    println!("{}", json);

    Ok(())
}

fn run_inspect(engine: &InsightsEngine, paths: &[PathBuf]) -> Result<()> {
    let mut files = FileData::new();

    for path in paths {
        let (kind, records) = load_source(path)?;
        println!("{:<14} {:>8} rows  {}", kind.name(), records.len(), path.display());
        if files.set(kind, records) {
            warn!(source = kind.code(), "Source given twice, keeping the last file");
        }
    }

    for kind in SourceKind::ALL {
        if files.slot(kind).is_none() {
            println!("{:<14} missing", kind.name());
        }
    }

    match engine.prepare(&files) {
        Some(prepared) => {
            println!("\n{}", prepared.quality.summary());
            println!(
                "Facets: {} years, {} months, {} user types, {} routes",
                prepared.facets.years.len(),
                prepared.facets.months.len(),
                prepared.facets.user_types.len(),
                prepared.facets.routes.len()
            );
        }
        None => println!("\nAll three sources are needed for the quality report"),
    }

    Ok(())
}
