use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use imgdedup::cli::args::{Cli, OutputFormat};
use imgdedup::cli::output;
use imgdedup::common::config::{DedupConfig, Settings};
use imgdedup::common::format;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _log_guard = init_logging(&cli)?;

    cmd_dedup(&cli)
}

/// stderr logging, plus an optional daily-rolling file. The returned guard
/// flushes the file writer on drop.
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let default_level = if cli.verbose { "imgdedup=debug" } else { "imgdedup=warn" };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "imgdedup.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).init();
            Ok(None)
        }
    }
}

fn build_config(cli: &Cli) -> Result<DedupConfig> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let mut config = DedupConfig::from_settings(&cli.folder, &settings);
    if let Some(threshold) = cli.threshold {
        config.similarity = threshold;
    }
    if let Some(threads) = cli.threads {
        config.workers = threads as usize;
    }
    let cwd = std::env::current_dir()?;
    if let Some(dir) = &cli.duplicates_dir {
        config.duplicates_root = cwd.join(dir);
    }
    if cli.no_report {
        config.report_path = None;
    } else if let Some(report) = &cli.report {
        config.report_path = Some(cwd.join(report));
    }
    config.delete = cli.delete;
    config.dry_run = cli.dry_run;
    config.contact_sheets = !cli.no_contact_sheets;

    Ok(config.validate()?)
}

// ─── Dedup ────────────────────────────────────────────────────────────────────

fn cmd_dedup(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;
    let show_progress = !cli.quiet && matches!(cli.format, OutputFormat::Human);

    if show_progress {
        println!();
        println!(
            "  {} Scanning for duplicates in: {}",
            "🔍",
            format::format_path(&config.root).cyan()
        );
        println!(
            "  {} Similarity threshold: {}%  •  {} threads  •  {}",
            "🖼️",
            config.similarity,
            config.workers,
            if config.dry_run {
                "dry run".yellow()
            } else if config.delete {
                "delete duplicates".red().bold()
            } else {
                "move duplicates".normal()
            }
        );
        println!();
    }

    let results = imgdedup::duplicates::find_duplicates(&config, show_progress)?;

    match cli.format {
        OutputFormat::Human if cli.quiet => output::print_dup_quiet(&results),
        OutputFormat::Human => output::print_dup_results(&results, &config.root),
        OutputFormat::Json => output::print_dup_json(&results),
        OutputFormat::Quiet => output::print_dup_quiet(&results),
    }

    Ok(())
}
