//! Partitioning engine
//!
//! Takes normalized records and produces per-owner output sets:
//! grouping by owner, splitting oversized lists into capped chunks
//! with fresh ids and numbered names, deduplicating sibling names,
//! and chunking orphan items.

pub mod alloc;
pub mod group;
pub mod names;
pub mod rebalance;

pub use alloc::IdAllocator;
pub use group::{group_records, GroupStats, GroupedData, OwnerGroup};
pub use names::{dedupe_primary_names, NameRegistry};
pub use rebalance::{rebalance_owner, EmittedList, OwnerOutput};
