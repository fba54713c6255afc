//! list-splitter - CSV export tool for capped library lists
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use list_splitter::config::{CliArgs, ExportConfig};
use list_splitter::export::ExportJob;
use list_splitter::progress::{print_header, print_summary, ProgressReporter};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose);

    let config = ExportConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.source.to_display_string(),
            config.worker_count,
            config.chunk_size,
            &config.out_dir.display().to_string(),
        );
    }

    let job = ExportJob::new(config.clone());

    let shutdown_flag = job.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    if let Some(ref p) = progress {
        p.set_status("Exporting...");
    }

    let result = job.run().context("Export failed")?;

    if let Some(ref p) = progress {
        if result.completed {
            p.finish("Export complete");
        } else {
            p.finish("Export interrupted");
        }
    }

    print_summary(&result, &config.out_dir.display().to_string());

    if !result.completed {
        info!("Export was interrupted before completion");
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("list_splitter=debug,warn")
    } else {
        EnvFilter::new("list_splitter=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
