//! AMM host binary - applies action batches to a file-backed ledger
//!
//! Usage:
//!   amm-host --state ledger.bin apply --actions actions.json
//!   cat actions.jsonl | amm-host apply --actions -
//!   amm-host --config amm.toml show

use amm_config::{HostConfig, LoggingSettings};
use amm_host::{apply_batch, parse_actions, StateStore, StateView};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "amm-host")]
#[command(about = "Constant-product AMM ledger host")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State file (overrides state.path)
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a batch of actions and persist the new state
    Apply {
        /// JSON array or JSON lines file, `-` for stdin
        #[arg(short, long)]
        actions: String,

        /// Stop at the first rejected action
        #[arg(long)]
        stop_on_error: bool,

        /// Report results without writing the state file
        #[arg(long)]
        dry_run: bool,
    },
    /// Print pools, balances and the state digest as JSON
    Show,
    /// Print the SHA3-256 digest of the committed state
    Commitment,
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = HostConfig::load(args.config.as_deref())?;
    if let Some(state) = &args.state {
        config.state.path = state.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json = true;
    }

    // Initialize logging
    init_logging(&config.logging)?;

    let store = StateStore::new(&config.state.path);
    match args.command {
        Command::Apply {
            actions,
            stop_on_error,
            dry_run,
        } => run_apply(&config, &store, &actions, stop_on_error, dry_run),
        Command::Show => {
            let engine = store.load(config.engine.clone())?;
            let view = StateView::capture(&engine)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        Command::Commitment => {
            let engine = store.load(config.engine.clone())?;
            let commitment = engine.commit()?;
            println!("{}", commitment.to_hex());
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn run_apply(
    config: &HostConfig,
    store: &StateStore,
    source: &str,
    stop_on_error: bool,
    dry_run: bool,
) -> Result<()> {
    let input = read_input(source)?;
    let actions = parse_actions(&input)?;
    info!("Applying {} actions to {:?}", actions.len(), store.path());

    let mut engine = store.load(config.engine.clone())?;
    let before = engine.commit()?;
    let report = apply_batch(&mut engine, actions, stop_on_error);

    for entry in &report.reports {
        println!("{}", serde_json::to_string(entry)?);
    }

    if dry_run {
        info!("Dry run, state not written");
    } else if report.writes() > 0 && engine.commit()? != before {
        store.save(&engine)?;
    } else {
        info!("State unchanged");
    }

    if stop_on_error && report.failed() > 0 {
        warn!(skipped = report.skipped, "Batch stopped at first rejected action");
        bail!(
            "{} action(s) rejected, {} skipped",
            report.failed(),
            report.skipped
        );
    }
    Ok(())
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read actions from stdin")?;
        return Ok(input);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read actions from {}", source))
}

fn init_logging(settings: &LoggingSettings) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("Invalid log filter")?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if settings.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
