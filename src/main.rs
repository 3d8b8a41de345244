//! Expenser entry point.
//!
//! Wires the pipeline end to end: scan the receipts folder, extract
//! every image through the configured LLM endpoint, normalize and
//! date-resolve the batch, then drive the expense application in the
//! operator's already-open browser. The run always finishes with a
//! printed per-record summary.

mod cli;
mod prompt;
mod scan;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use expenser_browser::Orchestrator;
use expenser_config::{Config, ConfigLoader};
use expenser_core::{
    normalize, resolve_trip_destination, DateResolver, ExpenseRecord, RunContext, RunSummary,
};
use expenser_extract::ReceiptExtractor;

use crate::cli::Cli;
use crate::prompt::StdinDatePrompt;
use crate::scan::scan_receipts;

/// Get the .expenser directory path.
fn expenser_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".expenser"))
        .unwrap_or_else(|| PathBuf::from(".expenser"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.expenser/debug/ with daily rotation.
fn init_tracing(verbose: bool) -> Result<()> {
    let log_dir = expenser_dir().join("debug");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("expenser")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)
        .map_err(|e| anyhow::anyhow!("creating log appender in {}: {e}", log_dir.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer guard alive for the program duration.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer (human-readable text format with colors)
        .with(fmt::layer().with_target(true).with_ansi(true))
        // File layer (text format without colors)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Run the pipeline. Returns `Ok(false)` for a run that completed but
/// left failed records behind.
async fn run(cli: Cli) -> Result<bool> {
    let config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    info!(config = %cli.config.display(), "configuration loaded");

    let extractor = ReceiptExtractor::new(&config);

    if cli.reset_llm {
        return verify_llm(&config, &extractor).await;
    }

    extractor.probe().await.with_context(|| {
        format!(
            "extraction endpoint {} is not usable; check [llm] settings or rerun with --reset-llm",
            config.llm.base_url
        )
    })?;
    info!(model = %config.llm.model, "extraction endpoint ready");

    let images = scan_receipts(&cli.receipts_dir)?;
    if images.is_empty() {
        println!("No receipt images found in {}", cli.receipts_dir.display());
        return Ok(true);
    }

    let results = extractor.extract_batch(&images).await;
    let records: Vec<ExpenseRecord> = images
        .iter()
        .zip(results)
        .map(|(image, result)| match result {
            Ok(raw) => normalize(&raw, &config, image),
            Err(e) => {
                error!(file = %image.display(), error = %e, "extraction failed");
                ExpenseRecord::failed(image.clone(), e.to_string())
            }
        })
        .collect();

    let mut ctx = RunContext::new(records, config.user.home_city.clone(), cli.test);

    let mut resolver = DateResolver::new();
    resolver.resolve_batch(&mut ctx.records, &mut StdinDatePrompt)?;
    ctx.last_accepted_date = resolver.last_accepted();

    ctx.trip_destination = resolve_trip_destination(
        &ctx.records,
        &config.user.home_city,
        &config.report.default_destination,
    );
    info!(destination = %ctx.trip_destination, "trip context resolved");

    let orchestrator = Orchestrator::connect(&config)
        .await
        .context("connecting to the browser; is it running with remote debugging enabled?")?;
    let browser_result = orchestrator.run(&mut ctx).await;

    // The summary prints even when the browser run aborted partway.
    let summary = RunSummary::from_context(&ctx);
    println!("{}", summary.render(&ctx.trip_destination));

    if let Err(e) = browser_result {
        error!(error = %e, "browser run aborted");
        return Ok(false);
    }

    Ok(!summary.has_failures())
}

/// Probe the extraction endpoint with the configured settings and
/// report the outcome without running the pipeline.
async fn verify_llm(config: &Config, extractor: &ReceiptExtractor) -> Result<bool> {
    match extractor.probe().await {
        Ok(()) => {
            println!(
                "Extraction endpoint {} accepted model {}",
                config.llm.base_url, config.llm.model
            );
            Ok(true)
        }
        Err(e) => {
            println!(
                "Extraction endpoint {} rejected the configured settings: {e}",
                config.llm.base_url
            );
            Ok(false)
        }
    }
}
