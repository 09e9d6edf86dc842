//! Sheetmap CLI - run and check spreadsheet imports

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sheetmap::prelude::*;
use sheetmap::{
    check_config, read_table, unresolved_variables, validate_expression, CsvWriteOptions,
    CsvWriter, RandomIdGenerator, RawRow, SequentialIdGenerator,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(author, version, about = "Configuration-driven spreadsheet import tool")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a CSV, TSV or JSON table and print the resulting documents as JSON
    Import(ImportArgs),

    /// Check one computed-field expression and list its variables
    CheckExpr {
        /// The expression to check
        expression: String,
    },

    /// Validate every configuration in a catalog file
    CheckConfig {
        /// Catalog file (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Catalog file (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Platform of the configuration to apply
    #[arg(short, long)]
    platform: String,

    /// Name of the configuration to apply
    #[arg(short, long)]
    name: String,

    /// Input table (csv, tsv, txt or json)
    #[arg(short, long)]
    input: PathBuf,

    /// Year prices are booked against
    #[arg(long)]
    year: i32,

    /// Month prices are booked against (1-12)
    #[arg(long)]
    month: u32,

    /// Snapshot date (YYYY-MM-DD, default: first day of the price month)
    #[arg(long)]
    snapshot_date: Option<NaiveDate>,

    /// Snapshot type stamped on secondary documents
    #[arg(long, default_value = "monthly")]
    snapshot_type: String,

    /// Data source stamped on secondary documents
    #[arg(long, default_value = "spreadsheet")]
    data_source: String,

    /// Dotted path of the natural key in primary documents
    #[arg(long)]
    key_path: Option<String>,

    /// JSON object mapping natural keys to stored entity ids
    #[arg(long)]
    entity_ids: Option<PathBuf>,

    /// Seed for reproducible random snapshot ids
    #[arg(long)]
    seed: Option<u64>,

    /// Use sequential snapshot ids with this prefix instead of random ones
    #[arg(long, conflicts_with = "seed")]
    sequential_ids: Option<String>,

    /// Field delimiter for csv/txt input
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// Output JSON file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write rejected rows to this CSV file
    #[arg(long)]
    rejects: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Import(args) => run_import(&args),
        Commands::CheckExpr { expression } => check_expr(&expression),
        Commands::CheckConfig { config } => check_catalog(&config),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(path: &Path) -> Result<ConfigCatalog> {
    ConfigCatalog::from_path(path)
        .with_context(|| format!("Failed to load catalog '{}'", path.display()))
}

fn load_entity_ids(path: &Path) -> Result<HashMap<String, String>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("'{}' is not a JSON object of strings", path.display()))
}

fn run_import(args: &ImportArgs) -> Result<()> {
    let catalog = load_catalog(&args.config)?;

    let period = PricePeriod::new(args.year, args.month)?;
    let snapshot_date = match args.snapshot_date {
        Some(date) => date,
        None => NaiveDate::from_ymd_opt(args.year, args.month, 1)
            .with_context(|| format!("Invalid price month {}-{}", args.year, args.month))?,
    };

    let mut context = ImportContext::new(snapshot_date)
        .with_snapshot_type(args.snapshot_type.as_str())
        .with_data_source(args.data_source.as_str());
    if let Some(key_path) = &args.key_path {
        context = context.with_key_path(key_path.as_str());
    }
    if let Some(path) = &args.entity_ids {
        context = context.with_entity_ids(load_entity_ids(path)?);
    }

    if !args.delimiter.is_ascii() {
        bail!("Delimiter must be a single ASCII character");
    }
    let options = CsvReadOptions {
        delimiter: args.delimiter as u8,
        ..Default::default()
    };
    let table = read_table(&args.input, &options)
        .with_context(|| format!("Failed to read '{}'", args.input.display()))?;

    let request = ImportRequest::new(&args.platform, &args.name, period, context);
    let output = match (&args.sequential_ids, args.seed) {
        (Some(prefix), _) => {
            catalog.import_with_ids(&request, &table, SequentialIdGenerator::new(prefix.as_str()))
        }
        (None, Some(seed)) => {
            catalog.import_with_ids(&request, &table, RandomIdGenerator::seeded(seed))
        }
        (None, None) => catalog.import(&request, &table),
    }
    .context("Import failed")?;

    let summary = output.summary();
    let document = serde_json::json!({
        "validData": &output.valid_data,
        "invalidRows": &output.invalid_rows,
        "secondaryData": &output.secondary_data,
        "summary": &summary,
    });

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            serde_json::to_writer_pretty(file, &document)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &document)?;
            writeln!(handle)?;
        }
    }

    if let Some(path) = &args.rejects {
        CsvWriter::write_file(&rejects_table(&output), path, &CsvWriteOptions::default())
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
    }

    eprintln!("{}", summary);
    Ok(())
}

/// Rejected rows prefixed with their row number, reason and header
fn rejects_table(output: &MappingOutput) -> Vec<RawRow> {
    let mut rows = vec![vec![
        RawCell::text("row"),
        RawCell::text("reason"),
        RawCell::text("field"),
    ]];
    for invalid in &output.invalid_rows {
        let mut row = vec![
            RawCell::Number(invalid.index as f64),
            RawCell::text(invalid.reason.as_str()),
            invalid.field.clone().into(),
        ];
        row.extend(invalid.raw_row.iter().cloned());
        rows.push(row);
    }
    rows
}

fn check_expr(expression: &str) -> Result<()> {
    let check = validate_expression(expression);
    println!("{}", serde_json::to_string_pretty(&check)?);
    if !check.valid {
        bail!("Invalid expression");
    }
    Ok(())
}

fn check_catalog(path: &Path) -> Result<()> {
    let catalog = load_catalog(path)?;
    let mut failures = 0;

    for config in catalog.iter() {
        match check_config(config) {
            Ok(()) => {
                println!("ok    {}/{}", config.platform, config.name);
                for unknown in unresolved_variables(config) {
                    println!(
                        "      warning: {} reads '{}', which no rule produces",
                        unknown.field, unknown.variable
                    );
                }
            }
            Err(e) => {
                failures += 1;
                println!("error {}/{}: {}", config.platform, config.name, e);
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} configurations are invalid", failures, catalog.len());
    }
    Ok(())
}
