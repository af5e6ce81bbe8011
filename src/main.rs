use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use aoy_audit::config;
use aoy_audit::output;
use aoy_audit::source::Source;
use aoy_audit::standings::{self, AuditReport, SeasonYear};
use aoy_audit::AuditError;

// Exit codes: 0 audit passed, 1 mismatches found, 2 config or data failure
const EXIT_PASSED: i32 = 0;
const EXIT_MISMATCH: i32 = 1;
const EXIT_FAILURE: i32 = 2;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute season totals and compare them to the materialized view (default)
    Audit,
    /// Print the recomputed Angler of the Year leaderboard
    Standings,
}

#[derive(Parser, Debug)]
#[command(name = "aoy-audit")]
#[command(about = "Audit Angler of the Year standings against raw tournament results", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/aoy-audit/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Number of best events counted per season (defaults to 4)
    #[arg(long, global = true, allow_negative_numbers = true)]
    best_n: Option<i64>,

    /// Restrict to one season (standings defaults to the latest season)
    #[arg(long, global = true)]
    season: Option<SeasonYear>,

    /// Mismatch rows to display (defaults to 20)
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Read raw results from a JSON export instead of the store
    #[arg(long, global = true, value_name = "PATH")]
    results_file: Option<PathBuf>,

    /// Read materialized standings from a JSON export (with --results-file)
    #[arg(long, global = true, value_name = "PATH", requires = "results_file")]
    standings_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

struct RunOptions {
    best_n: usize,
    season: Option<SeasonYear>,
    limit: usize,
    json: bool,
    use_colors: bool,
}

#[tokio::main]
async fn main() {
    // .env.local first so it takes precedence
    let env_loaded = load_env_files(&[Path::new(".env.local"), Path::new(".env")]);

    let cli = Cli::parse();
    aoy_audit::telemetry::init_tracing(cli.verbose);

    let outcome = match env_loaded {
        Ok(()) => run(cli).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &outcome {
        eprintln!("Error: {}", e);
    }

    std::process::exit(exit_code_for(&outcome));
}

/// Map a finished run to the process exit code. `Ok(None)` is a run with
/// no audit verdict (the standings listing).
fn exit_code_for(outcome: &Result<Option<AuditReport>, AuditError>) -> i32 {
    match outcome {
        Ok(Some(report)) if !report.passed => EXIT_MISMATCH,
        Ok(_) => EXIT_PASSED,
        Err(_) => EXIT_FAILURE,
    }
}

/// Load dotenv files in order. Missing files are fine; unreadable or
/// malformed ones are not.
fn load_env_files(paths: &[&Path]) -> Result<(), AuditError> {
    for path in paths {
        match dotenvy::from_filename(path) {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(AuditError::invalid_config(format!(
                    "failed to load {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<Option<AuditReport>, AuditError> {
    let command = cli.command.unwrap_or(Commands::Audit);

    let file_config = config::load_config(cli.config)
        .map_err(|e| AuditError::invalid_config(format!("{:#}", e)))?;

    if let Err(errors) = config::validate_config(&file_config) {
        eprintln!("Config errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(AuditError::invalid_config(format!(
            "{} problem(s) in config file",
            errors.len()
        )));
    }

    let best_n = config::resolve_best_n(&file_config, cli.best_n)?;
    let limit = cli
        .limit
        .or(file_config.report.limit)
        .unwrap_or(config::DEFAULT_REPORT_LIMIT);
    if limit == 0 {
        return Err(AuditError::invalid_config("--limit must be at least 1"));
    }

    let source = match cli.results_file {
        Some(results) => Source::Snapshot {
            results,
            standings: cli.standings_file,
        },
        None => Source::Remote(config::resolve_source(&file_config, config::env_var)?),
    };

    let options = RunOptions {
        best_n,
        season: cli.season,
        limit,
        json: cli.json,
        use_colors: output::should_use_colors(),
    };

    tracing::debug!(best_n, season = ?options.season, "starting {:?}", command);

    match command {
        Commands::Audit => run_audit(&source, &options).await.map(Some),
        Commands::Standings => run_standings(&source, &options).await.map(|()| None),
    }
}

async fn run_audit(source: &Source, options: &RunOptions) -> Result<AuditReport, AuditError> {
    let start_time = Instant::now();

    let (results, materialized) = source.load_all().await?;
    if !results.issues.is_empty() || !materialized.issues.is_empty() {
        tracing::warn!(
            results = results.issues.len(),
            standings = materialized.issues.len(),
            "malformed records were dropped or coerced"
        );
    }

    let mut totals = standings::aggregate(&results.records, options.best_n)?;
    standings::retain_season(&mut totals, options.season);

    let rows: Vec<_> = materialized
        .records
        .into_iter()
        .filter(|row| options.season.map_or(true, |s| row.season_year == s))
        .collect();

    let report = standings::audit(&rows, &totals);

    let json = options
        .json
        .then(|| {
            output::format_json_report(&report, options.best_n, options.season, chrono::Utc::now())
        })
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}; falling back to table output", e);
            None
        });

    match json {
        Some(json) => println!("{}", json),
        None => {
            if !report.passed {
                println!(
                    "{}",
                    output::format_mismatch_table(
                        &report.mismatches,
                        options.limit,
                        options.use_colors
                    )
                );
                println!();
            }
            println!("{}", output::format_summary(&report, options.use_colors));
        }
    }

    tracing::debug!(elapsed = ?start_time.elapsed(), "audit finished");

    Ok(report)
}

async fn run_standings(source: &Source, options: &RunOptions) -> Result<(), AuditError> {
    let results = source.load_results().await?;
    let totals = standings::aggregate(&results.records, options.best_n)?;

    let Some(season) = options.season.or_else(|| standings::latest_season(&totals)) else {
        println!("No results found.");
        return Ok(());
    };

    let ranked = standings::rank_season(&totals, season);

    if options.json {
        match serde_json::to_string_pretty(&ranked) {
            Ok(json) => {
                println!("{}", json);
                return Ok(());
            }
            Err(e) => eprintln!("Error: {}; falling back to table output", e),
        }
    }

    println!(
        "{}",
        output::format_standings_table(&ranked, season, options.best_n, options.use_colors)
    );

    Ok(())
}
