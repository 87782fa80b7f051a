use clap::{Parser, Subcommand};
use pmml_eval::{config, Engine, EngineConfig};
use pmml_eval_cli::{check, read_expected_file, read_rows_file, CliResult, Mismatch};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every row and print one JSON object of outputs per line
    Score(ScoreArgs),

    /// Compare one numeric output against a file of expected values
    Check(CheckArgs),
}

#[derive(Parser)]
struct ScoreArgs {
    /// Model document (JSON)
    model: PathBuf,

    /// Input rows, one JSON object per line
    rows: PathBuf,

    /// Engine config file (JSON)
    #[arg(short, long, env = "PMML_EVAL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Parser)]
struct CheckArgs {
    /// Model document (JSON)
    model: PathBuf,

    /// Input rows, one JSON object per line
    rows: PathBuf,

    /// Expected values, one number per line
    expected: PathBuf,

    /// Name of the output to compare
    #[arg(short, long)]
    output: String,

    /// Engine config file (JSON)
    #[arg(short, long, env = "PMML_EVAL_CONFIG")]
    config: Option<PathBuf>,
}

fn load_engine(model: &PathBuf, config_path: Option<&PathBuf>) -> CliResult<Engine> {
    let engine_config = match config_path {
        Some(path) => config::from_file(path)?,
        None => EngineConfig::default(),
    };
    debug!(?engine_config, "engine config");
    Ok(Engine::from_file(model, engine_config)?)
}

fn run_score(args: &ScoreArgs) -> CliResult<bool> {
    let engine = load_engine(&args.model, args.config.as_ref())?;
    let rows = read_rows_file(&args.rows)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut failures = 0;
    for (i, result) in engine.evaluate_batch(&rows).into_iter().enumerate() {
        match result {
            Ok(outputs) => {
                serde_json::to_writer(&mut out, &outputs).map_err(io::Error::from)?;
                writeln!(out)?;
            }
            Err(err) => {
                failures += 1;
                writeln!(out, "null")?;
                eprintln!("row {}: {} error: {}", i, err.kind(), err);
            }
        }
    }
    out.flush()?;
    info!(rows = rows.len(), failures, "scored");
    Ok(failures == 0)
}

fn run_check(args: &CheckArgs) -> CliResult<bool> {
    let engine = load_engine(&args.model, args.config.as_ref())?;
    let rows = read_rows_file(&args.rows)?;
    let expected = read_expected_file(&args.expected)?;

    let mismatches = check(&engine, &rows, &expected, &args.output)?;
    for m in &mismatches {
        match &m.mismatch {
            Mismatch::Differs { expected, actual } => {
                println!("failed on {}, expected {}, got {}", m.row, expected, actual)
            }
            Mismatch::NotNumeric { expected } => println!(
                "failed on {}, expected {}, output {} is not numeric",
                m.row, expected, args.output
            ),
            Mismatch::NoResult { expected } => {
                println!("failed on {}, expected {}, got no result", m.row, expected)
            }
            Mismatch::Failed {
                expected,
                kind,
                message,
            } => println!(
                "failed on {}, expected {}, {} error: {}",
                m.row, expected, kind, message
            ),
        }
    }
    println!("{} of {} rows match", rows.len() - mismatches.len(), rows.len());
    Ok(mismatches.is_empty())
}

fn run(cli: &Cli) -> CliResult<bool> {
    match &cli.command {
        Commands::Score(args) => run_score(args),
        Commands::Check(args) => run_check(args),
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
