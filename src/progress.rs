//! Progress reporting for the exporter
//!
//! Provides a spinner during the run plus styled header and summary
//! blocks, using indicatif and console.

use crate::export::ExportResult;
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while the export runs
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let mut count = 0;
    for c in s.chars().rev() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Print a header at the start of the export
pub fn print_header(source: &str, workers: usize, chunk_size: usize, out_dir: &str) {
    println!();
    println!(
        "{} {}",
        style("list-splitter").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!(
        "  {} {} items per list",
        style("Chunk size:").bold(),
        format_number(chunk_size as u64)
    );
    println!("  {} {}", style("Output:").bold(), out_dir);
    println!();
}

/// Print a summary of the export results
pub fn print_summary(result: &ExportResult, out_dir: &str) {
    println!();
    if result.completed {
        println!("{}", style("Export Complete").green().bold());
    } else {
        println!("{}", style("Export Interrupted").yellow().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Owners:").bold(),
        format_number(result.owners_emitted)
    );
    if result.synthetic_lists > 0 {
        println!(
            "  {} {} ({} synthetic from {} split lists)",
            style("Lists:").bold(),
            format_number(result.primary_lists + result.synthetic_lists),
            format_number(result.synthetic_lists),
            format_number(result.lists_split)
        );
    } else {
        println!(
            "  {} {}",
            style("Lists:").bold(),
            format_number(result.primary_lists)
        );
    }
    println!(
        "  {} {}",
        style("Items:").bold(),
        format_number(result.items_written)
    );
    if result.orphans_written > 0 {
        println!(
            "  {} {}",
            style("Orphans:").bold(),
            format_number(result.orphans_written)
        );
    }
    if result.lists_dropped > 0 || result.items_dropped > 0 {
        println!(
            "  {} {} lists, {} items",
            style("Dropped:").yellow().bold(),
            format_number(result.lists_dropped),
            format_number(result.items_dropped)
        );
    }
    println!(
        "  {} {} ({})",
        style("Files:").bold(),
        format_number(result.files_written),
        format_size(result.bytes_written, BINARY)
    );
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        result.duration.as_secs_f64()
    );
    println!("  {} {}", style("Output:").bold(), out_dir);
    println!();
}
