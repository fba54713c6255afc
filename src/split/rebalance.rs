//! Chunk rebalancing
//!
//! Walks one owner's lists in source order. Lists within the cap pass
//! through unchanged; oversized lists are replaced by consecutive
//! capped chunks, each a fresh synthetic list with a numbered name and
//! an allocator-issued id. Orphan items are chunked the same way,
//! without list records.

use crate::normalize::{ItemRecord, ListRecord};
use crate::split::alloc::IdAllocator;
use crate::split::group::OwnerGroup;
use crate::split::names::NameRegistry;
use std::collections::HashMap;
use tracing::debug;

/// A list scheduled for emission, paired with its item rows
#[derive(Debug)]
pub struct EmittedList {
    pub record: ListRecord,
    /// Items sorted by added_at, re-tagged with the emitted list id
    pub items: Vec<ItemRecord>,
}

/// Everything to be written for one owner
#[derive(Debug)]
pub struct OwnerOutput {
    pub owner_id: i64,
    /// Lists that fit the cap, in source order
    pub primaries: Vec<EmittedList>,
    /// Synthetic chunk lists, in creation order
    pub rebalanced: Vec<EmittedList>,
    /// Capped chunks of items with no list
    pub orphan_chunks: Vec<Vec<ItemRecord>>,
    /// How many source lists were split
    pub lists_split: u64,
}

impl OwnerOutput {
    /// Total item rows across all list files
    pub fn item_count(&self) -> u64 {
        let primary: usize = self.primaries.iter().map(|l| l.items.len()).sum();
        let rebalanced: usize = self.rebalanced.iter().map(|l| l.items.len()).sum();
        (primary + rebalanced) as u64
    }

    /// Total rows across orphan chunks
    pub fn orphan_count(&self) -> u64 {
        self.orphan_chunks.iter().map(|c| c.len() as u64).sum()
    }
}

/// Rebalance one owner's lists and orphans into capped output sets
pub fn rebalance_owner(
    group: OwnerGroup,
    items_by_list: &mut HashMap<i64, Vec<ItemRecord>>,
    cap: usize,
    alloc: &mut IdAllocator,
    names: &mut NameRegistry,
) -> OwnerOutput {
    let mut primaries = Vec::new();
    let mut rebalanced = Vec::new();
    let mut lists_split = 0u64;

    for list in group.lists {
        let mut items = items_by_list.remove(&list.id).unwrap_or_default();
        sort_by_added_at(&mut items);

        if items.len() <= cap {
            let mut emitted = EmittedList { record: list, items };
            retag(&mut emitted);
            primaries.push(emitted);
        } else {
            lists_split += 1;
            debug!(
                owner = group.owner_id,
                list_id = list.id,
                items = items.len(),
                cap,
                "Splitting oversized list"
            );
            for chunk in chunk_items(items, cap) {
                let record = ListRecord {
                    id: alloc.next_id(),
                    name: names.next_numbered_name(&list.name),
                    ..list.clone()
                };
                let mut emitted = EmittedList { record, items: chunk };
                retag(&mut emitted);
                rebalanced.push(emitted);
            }
        }
    }

    let mut orphans = group.orphans;
    for item in &mut orphans {
        // Orphan rows render a blank list id, whatever garbage the
        // source association held
        item.list_id = None;
    }
    sort_by_added_at(&mut orphans);
    let orphan_chunks = if orphans.is_empty() {
        Vec::new()
    } else {
        chunk_items(orphans, cap)
    };

    OwnerOutput {
        owner_id: group.owner_id,
        primaries,
        rebalanced,
        orphan_chunks,
        lists_split,
    }
}

/// Stable sort by timestamp; empty timestamps sort first and ties keep
/// source order
fn sort_by_added_at(items: &mut [ItemRecord]) {
    items.sort_by(|a, b| a.added_at.cmp(&b.added_at));
}

/// Stamp every row with its (possibly new) parent list id
fn retag(list: &mut EmittedList) {
    for item in &mut list.items {
        item.list_id = Some(list.record.id);
    }
}

/// Break items into consecutive chunks of at most `cap` rows
fn chunk_items(items: Vec<ItemRecord>, cap: usize) -> Vec<Vec<ItemRecord>> {
    let mut chunks = Vec::with_capacity(items.len().div_ceil(cap));
    let mut current = Vec::with_capacity(cap.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == cap {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
