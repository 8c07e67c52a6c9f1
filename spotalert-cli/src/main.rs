//! spotalert CLI - day-ahead electricity price alerts.
//!
//! Commands:
//! - `run`: fetch the target day's prices, publish the snapshot, alert on cheap hours
//! - `check-config`: validate the config and show which channels are enabled
//! - `show-snapshot`: summarize the currently published snapshot
//!
//! Exit status is 0 when a run completes or finds no data yet, 1 on any fault.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};

use spotalert_core::gateway::EntsoeGateway;
use spotalert_core::notify::ChannelOutcome;
use spotalert_core::snapshot::{SnapshotPublisher, DEFAULT_SNAPSHOT_PATH};
use spotalert_runner::{
    build_channels, init_tracing, Pipeline, PipelineConfig, RunOutcome, RunReport, Secrets,
    TargetDayPolicy, DEFAULT_CONFIG_PATH,
};

#[derive(Parser)]
#[command(
    name = "spotalert",
    version,
    about = "spotalert - day-ahead electricity price alerts"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once.
    Run {
        /// Path to a TOML config file. Defaults to ./spotalert.toml if present.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the snapshot output path.
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Override the target-day policy: next_day or latest_available.
        #[arg(long)]
        policy: Option<TargetDayPolicy>,

        /// Log the snapshot and notification instead of writing and sending them.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Validate the config and print the effective settings.
    CheckConfig {
        /// Path to a TOML config file. Defaults to ./spotalert.toml if present.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a summary of the published snapshot.
    ShowSnapshot {
        /// Snapshot path.
        #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            snapshot,
            policy,
            dry_run,
        } => run_pipeline(config.as_deref(), snapshot, policy, dry_run),
        Commands::CheckConfig { config } => run_check_config(config.as_deref()),
        Commands::ShowSnapshot { path } => run_show_snapshot(&path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// An explicit path must exist; the default path may be absent.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::from_file(path),
        None => PipelineConfig::from_file_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    };
    config.context("loading configuration")
}

fn run_pipeline(
    config_path: Option<&Path>,
    snapshot: Option<PathBuf>,
    policy: Option<TargetDayPolicy>,
    dry_run: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(path) = snapshot {
        config.snapshot_path = path;
    }
    if let Some(policy) = policy {
        config.target_day_policy = policy;
    }

    let secrets = Secrets::from_env();
    let api_key = secrets.require_entsoe_key()?;
    let timezone = config.market_timezone()?;
    let gateway = EntsoeGateway::new(
        api_key,
        config.gateway.base_url.clone(),
        config.gateway.timeout(),
    )
    .context("building market-data client")?
    .with_timezone(timezone);

    let channels = if dry_run {
        info!("dry run: snapshot and notifications are logged, not written or sent");
        Vec::new()
    } else {
        build_channels(&config, &secrets)
    };

    let report = Pipeline::new(config, Box::new(gateway), channels)?
        .with_dry_run(dry_run)
        .run()
        .context("price alert run failed")?;
    log_report(&report);
    Ok(())
}

fn log_report(report: &RunReport) {
    match report.outcome {
        RunOutcome::Completed => {
            let failed: Vec<&str> = report
                .channel_results
                .iter()
                .filter_map(|r| match &r.outcome {
                    ChannelOutcome::Failed(_) => Some(r.channel_name.as_str()),
                    ChannelOutcome::Delivered => None,
                })
                .collect();
            info!(
                day = %report.day,
                zone = %report.zone,
                samples = report.sample_count,
                intervals = report.intervals.len(),
                notified = report.notification_composed(),
                suppressed = report.suppressed_repeat,
                dry_run = report.dry_run,
                delivered = report.delivered_count(),
                failed = ?failed,
                "run completed"
            );
        }
        RunOutcome::NotYetPublished => {
            info!(day = %report.day, zone = %report.zone, "no prices published yet, nothing to do")
        }
        RunOutcome::Empty => {
            info!(day = %report.day, zone = %report.zone, "no prices returned, nothing to do")
        }
    }
}

fn run_check_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let secrets = Secrets::from_env();

    let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
    println!("{rendered}");
    println!("market timezone: {}", config.market_timezone()?);

    let api_key = if secrets.entsoe_key.is_some() { "set" } else { "MISSING" };
    println!("ENTSOE_KEY: {api_key}");

    let channels = build_channels(&config, &secrets);
    if channels.is_empty() {
        println!("channels: none enabled");
    } else {
        let names: Vec<&str> = channels.iter().map(|c| c.name()).collect();
        println!("channels: {}", names.join(", "));
    }

    secrets.require_entsoe_key()?;
    Ok(())
}

fn run_show_snapshot(path: &Path) -> Result<()> {
    let snapshot = SnapshotPublisher::new(path)
        .load()?
        .with_context(|| format!("no snapshot at {}", path.display()))?;

    println!("Day:         {}", snapshot.day);
    println!("Updated:     {}", snapshot.updated.to_rfc3339());
    if let Some(zone) = &snapshot.zone {
        println!("Zone:        {zone}");
    }
    match snapshot.resolution_minutes {
        Some(minutes) => println!("Samples:     {} ({minutes}-minute)", snapshot.data.len()),
        None => println!("Samples:     {}", snapshot.data.len()),
    }

    let lowest = snapshot
        .data
        .iter()
        .min_by(|a, b| a.price_eur.total_cmp(&b.price_eur));
    let highest = snapshot
        .data
        .iter()
        .max_by(|a, b| a.price_eur.total_cmp(&b.price_eur));
    if let (Some(lo), Some(hi)) = (lowest, highest) {
        println!(
            "Lowest:      {:.2} EUR/MWh ({:.4} €/kWh) at {}",
            lo.price_eur,
            lo.price_kwh,
            lo.time.format("%H:%M")
        );
        println!(
            "Highest:     {:.2} EUR/MWh ({:.4} €/kWh) at {}",
            hi.price_eur,
            hi.price_kwh,
            hi.time.format("%H:%M")
        );
    }
    if let Some(hash) = &snapshot.data_hash {
        println!("Data hash:   {hash}");
    }
    Ok(())
}
