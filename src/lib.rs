//! # list-splitter
//!
//! Exports "lists" and their "items" from a relational source,
//! normalizes every field to canonical text, splits lists whose item
//! count exceeds a cap into numbered synthetic sub-lists, and writes
//! one deterministic CSV file set per owner.
//!
//! ## Features
//!
//! - **Two source backends**: SQLite files read directly, PostgreSQL
//!   fetched through a psql COPY subprocess
//! - **Forgiving normalization**: dirty integers, flags and timestamps
//!   degrade to defaults instead of aborting the run
//! - **Parallel normalization**: rows fan out over a bounded-channel
//!   worker pool, with input order restored
//! - **Capped splitting**: oversized lists become numbered sub-lists
//!   with collision-free synthetic ids
//! - **Atomic output**: every CSV is staged as a temp file and renamed
//!   into place, so interruption never leaves partial files
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Source database             │
//! │  (SQLite file / PostgreSQL)  │
//! └──────────────┬───────────────┘
//!                │ raw rows
//!                ▼
//! ┌──────────────────────────────┐
//! │  Normalizer pool             │
//! │  (N workers, order restored) │
//! └──────────────┬───────────────┘
//!                │ canonical records
//!                ▼
//! ┌──────────────────────────────┐
//! │  Owner grouping              │
//! │  (first-seen order)          │
//! └──────────────┬───────────────┘
//!                │ per-owner groups
//! ┌──────────────▼───────────────┐
//! │  Rebalancer + name dedup     │◄── id allocator
//! └──────────────┬───────────────┘
//!                │ output sets
//!                ▼
//! ┌──────────────────────────────┐
//! │  Emitter (atomic CSV files)  │
//! │  out/<owner>/lists_1.csv ... │
//! └──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```bash
//! # Export from PostgreSQL, 5000 items per list
//! list-splitter postgres://exporter@db.local/library -o ./out
//!
//! # Export from a SQLite archive with a smaller cap
//! list-splitter archive.db -o ./out -c 1000
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod export;
pub mod normalize;
pub mod progress;
pub mod source;
pub mod split;

pub use config::{CliArgs, ExportConfig, SourceUrl};
pub use error::{ExportError, Result};
pub use export::{ExportJob, ExportResult};
