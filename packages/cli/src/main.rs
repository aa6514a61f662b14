#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for fetching a player's Tempus records.
//!
//! Loads the class-specific map catalog, fetches the player's record on
//! every map in rate-limited batches, and writes the results (and the maps
//! without a record) as semicolon-delimited files.
//!
//! Uses `indicatif-log-bridge` (via [`tempus_records_cli_utils::init_logger`])
//! so retry and batch log lines never fight the progress bar. Ctrl-C stops
//! the run after the lookups already in flight; partial results are still
//! written.

use std::path::PathBuf;

use clap::Parser;
use tempus_records::config::EngineConfig;
use tempus_records::progress::log_events;
use tempus_records::scheduler::CancellationFlag;
use tempus_records_cli_utils::IndicatifProgress;
use tempus_records_models::PlayerClass;
use tempus_records_storage::{catalog, report};

#[derive(Parser)]
#[command(
    name = "tempus_records",
    about = "Fetch a player's Tempus record on every map of a catalog"
)]
struct Cli {
    /// Tempus player id
    #[arg(long)]
    player: u64,
    /// Class to look up: soldier, demoman, 3, or 4
    #[arg(long)]
    class: PlayerClass,
    /// Map catalog file (defaults to the class's `all_maps_<class>_info.csv`)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Results file
    #[arg(long, default_value = report::RESULTS_FILE)]
    output: PathBuf,
    /// File listing maps without a record (written only if any)
    #[arg(long, default_value = report::FAILED_FILE)]
    failed_output: PathBuf,
    /// TOML engine configuration; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Tempus API root
    #[arg(long, env = "TEMPUS_API_BASE")]
    base_url: Option<String>,
    /// Maps per batch
    #[arg(long)]
    batch_size: Option<usize>,
    /// Maximum lookups in flight within a batch
    #[arg(long)]
    max_parallel: Option<usize>,
    /// Pause between batches, in milliseconds
    #[arg(long)]
    cooldown_ms: Option<u64>,
    /// Attempts per map before giving up
    #[arg(long)]
    max_retries: Option<u32>,
    /// Per-request timeout, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Do not pause after the final batch
    #[arg(long)]
    skip_final_cooldown: bool,
}

impl Cli {
    /// Builds the engine configuration: defaults, then the config file,
    /// then command-line overrides.
    fn engine_config(&self) -> Result<EngineConfig, tempus_records::ConfigError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = max_parallel;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            config.cooldown_ms = cooldown_ms;
        }
        if let Some(max_retries) = self.max_retries {
            config.max_retries = max_retries;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if self.skip_final_cooldown {
            config.cooldown_after_last_batch = false;
        }

        config.validate()?;
        Ok(config)
    }

    fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.class.default_catalog_file()))
    }
}

/// What a Ctrl-C should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Stop dispatching and write partial results.
    Cancel,
    /// A cancellation is already pending; exit immediately.
    Exit,
}

fn interrupt(cancel: &CancellationFlag) -> Interrupt {
    if cancel.is_cancelled() {
        return Interrupt::Exit;
    }
    cancel.cancel();
    Interrupt::Cancel
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = tempus_records_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = cli.engine_config()?;
    let catalog_path = cli.catalog_path();
    log::info!("Loading map data from {}...", catalog_path.display());
    let maps = catalog::load_catalog(&catalog_path)?;

    let cancel = CancellationFlag::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt(&on_ctrl_c) == Interrupt::Exit {
                log::warn!("Interrupted again, exiting without writing results");
                std::process::exit(130);
            }
            log::warn!(
                "Interrupted, finishing lookups already in flight (Ctrl-C again to exit now)..."
            );
        }
    });

    log::info!(
        "Fetching player records for player {}, class {}...",
        cli.player,
        cli.class
    );
    let progress = IndicatifProgress::maps_bar(&multi, "Preparing...");
    let run = tempus_records::fetch_player_records(
        &config,
        &maps,
        cli.player,
        cli.class,
        log_events(),
        progress,
        cancel,
    )
    .await?;
    let summary = &run.summary;

    report::save_results(&cli.output, &summary.results)?;
    if summary.failed.is_empty() {
        log::info!("No failed maps!");
    } else {
        report::save_failed(&cli.failed_output, &summary.failed)?;
        log::warn!(
            "{} maps returned no record. Logged to: {}",
            summary.failed.len(),
            cli.failed_output.display()
        );
    }

    if run.cancelled {
        println!(
            "Stopped early: {} of {} maps processed.",
            summary.results.len(),
            maps.len()
        );
    }
    println!(
        "Done in {}s. Player records saved to: {}",
        (run.finished_at - run.started_at).num_seconds(),
        cli.output.display()
    );
    println!("Successful maps: {}", summary.success_count);
    println!("Failed maps: {}", summary.failed_count);

    Ok(())
}
