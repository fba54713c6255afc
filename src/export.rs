//! Export job orchestration
//!
//! Wires the pipeline together: fetch raw rows, normalize them in
//! parallel, group by owner, rebalance oversized lists, deduplicate
//! names, and emit per-owner CSV file sets. Owners are processed in
//! first-seen order; a shutdown request is honored between owners and
//! between files.

use crate::config::ExportConfig;
use crate::emit::{self, EmitStats};
use crate::error::{EmitError, Result, SourceError};
use crate::normalize::{self, pool};
use crate::source;
use crate::split::{
    dedupe_primary_names, group_records, rebalance_owner, GroupedData, IdAllocator, NameRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of an export run
#[derive(Debug)]
pub struct ExportResult {
    /// Raw list rows fetched from the source
    pub lists_fetched: u64,
    /// Raw item rows fetched from the source
    pub items_fetched: u64,
    /// Owner directories fully written
    pub owners_emitted: u64,
    /// Owners skipped because they had orphans but no lists
    pub owners_skipped: u64,
    /// Lists emitted unchanged
    pub primary_lists: u64,
    /// Synthetic lists created by splitting
    pub synthetic_lists: u64,
    /// Source lists that were split
    pub lists_split: u64,
    /// Item rows written into list files
    pub items_written: u64,
    /// Item rows written into orphan chunks
    pub orphans_written: u64,
    /// Lists dropped for having no owner
    pub lists_dropped: u64,
    /// Items dropped: no owner, unreachable list, or skipped owner
    pub items_dropped: u64,
    /// Files written
    pub files_written: u64,
    /// Bytes written
    pub bytes_written: u64,
    /// Wall time for the run
    pub duration: Duration,
    /// Whether the run completed (vs was interrupted)
    pub completed: bool,
}

/// One-shot export job
pub struct ExportJob {
    config: ExportConfig,
    shutdown: Arc<AtomicBool>,
}

impl ExportJob {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the export
    pub fn run(self) -> Result<ExportResult> {
        let start = Instant::now();
        info!(
            source = %self.config.source.to_display_string(),
            out_dir = %self.config.out_dir.display(),
            chunk_size = self.config.chunk_size,
            workers = self.config.worker_count,
            "Starting export"
        );

        let (raw_lists, raw_items) = source::fetch_rows(&self.config)?;
        if raw_lists.is_empty() {
            return Err(SourceError::NoLists.into());
        }
        if raw_items.is_empty() {
            return Err(SourceError::NoItems.into());
        }
        let lists_fetched = raw_lists.len() as u64;
        let items_fetched = raw_items.len() as u64;

        let mut lists = pool::normalize_rows(
            raw_lists,
            self.config.worker_count,
            normalize::normalize_list,
        )?;
        let items = pool::normalize_rows(
            raw_items,
            self.config.worker_count,
            normalize::normalize_item,
        )?;

        if let Some(max) = self.config.max_lists {
            if lists.len() > max {
                info!(kept = max, total = lists.len(), "Limiting lists processed");
                lists.truncate(max);
            }
        }

        // Seed before grouping so the allocator sees every processed list
        let mut alloc = IdAllocator::from_lists(&lists, self.config.start_id);

        let GroupedData {
            owners,
            mut items_by_list,
            stats: group_stats,
        } = group_records(lists, items);

        std::fs::create_dir_all(&self.config.out_dir).map_err(|e| EmitError::CreateDirFailed {
            path: self.config.out_dir.clone(),
            reason: e.to_string(),
        })?;

        let mut stats = EmitStats::default();
        let mut result = ExportResult {
            lists_fetched,
            items_fetched,
            owners_emitted: 0,
            owners_skipped: 0,
            primary_lists: 0,
            synthetic_lists: 0,
            lists_split: 0,
            items_written: 0,
            orphans_written: 0,
            lists_dropped: group_stats.lists_without_owner,
            items_dropped: group_stats.items_without_owner + group_stats.items_unreachable,
            files_written: 0,
            bytes_written: 0,
            duration: Duration::default(),
            completed: true,
        };

        for group in owners {
            if self.shutdown.load(Ordering::Relaxed) {
                result.completed = false;
                break;
            }

            if group.lists.is_empty() {
                warn!(
                    owner = group.owner_id,
                    orphans = group.orphans.len(),
                    "Owner has no lists, skipping"
                );
                result.owners_skipped += 1;
                result.items_dropped += group.orphans.len() as u64;
                continue;
            }

            let mut names = NameRegistry::new();
            let mut output = rebalance_owner(
                group,
                &mut items_by_list,
                self.config.chunk_size,
                &mut alloc,
                &mut names,
            );
            dedupe_primary_names(&mut output.primaries, &mut names);

            if !emit::emit_owner(&self.config.out_dir, &output, &self.shutdown, &mut stats)? {
                result.completed = false;
                break;
            }

            result.owners_emitted += 1;
            result.primary_lists += output.primaries.len() as u64;
            result.synthetic_lists += output.rebalanced.len() as u64;
            result.lists_split += output.lists_split;
            result.items_written += output.item_count();
            result.orphans_written += output.orphan_count();
        }

        result.files_written = stats.files_written;
        result.bytes_written = stats.bytes_written;
        result.duration = start.elapsed();

        info!(
            owners = result.owners_emitted,
            lists = result.primary_lists + result.synthetic_lists,
            split = result.lists_split,
            items = result.items_written,
            files = result.files_written,
            duration_secs = result.duration.as_secs_f64(),
            "Export finished"
        );

        Ok(result)
    }
}
