//! Owner grouping
//!
//! Partitions normalized lists and items into per-owner groups while
//! preserving input order: owners appear in first-seen order, lists
//! keep source order within their owner, items keep source order
//! within their list. Records that cannot be filed anywhere are
//! dropped here, with warnings, and counted for the run summary.

use crate::normalize::{ItemRecord, ListRecord};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Lists and orphan items belonging to one owner
#[derive(Debug)]
pub struct OwnerGroup {
    pub owner_id: i64,
    /// Lists in source order
    pub lists: Vec<ListRecord>,
    /// Items with no list association, in source order
    pub orphans: Vec<ItemRecord>,
}

/// Counters for records grouping had to drop
#[derive(Debug, Default, Clone, Copy)]
pub struct GroupStats {
    /// Lists with no owner at all
    pub lists_without_owner: u64,
    /// Orphan items with no owner at all
    pub items_without_owner: u64,
    /// Items filed under a list id no kept list claims
    pub items_unreachable: u64,
}

/// Everything the rebalancer needs, grouped and ordered
#[derive(Debug)]
pub struct GroupedData {
    /// Owner groups in first-seen order
    pub owners: Vec<OwnerGroup>,
    /// Items keyed by their list id, each bucket in source order
    pub items_by_list: HashMap<i64, Vec<ItemRecord>>,
    pub stats: GroupStats,
}

/// Partition normalized records by owner
pub fn group_records(lists: Vec<ListRecord>, items: Vec<ItemRecord>) -> GroupedData {
    let mut owners: Vec<OwnerGroup> = Vec::new();
    let mut owner_index: HashMap<i64, usize> = HashMap::new();
    let mut kept_list_ids: HashSet<i64> = HashSet::new();
    let mut stats = GroupStats::default();

    for list in lists {
        let Some(owner_id) = list.owner_id else {
            warn!(list_id = list.id, "List has no owner, dropping");
            stats.lists_without_owner += 1;
            continue;
        };
        kept_list_ids.insert(list.id);
        let slot = owner_slot(&mut owners, &mut owner_index, owner_id);
        owners[slot].lists.push(list);
    }

    let mut items_by_list: HashMap<i64, Vec<ItemRecord>> = HashMap::new();
    let mut unreachable: HashMap<i64, u64> = HashMap::new();

    for item in items {
        match item.list_id {
            Some(list_id) if list_id != 0 => {
                if kept_list_ids.contains(&list_id) {
                    items_by_list.entry(list_id).or_default().push(item);
                } else {
                    stats.items_unreachable += 1;
                    *unreachable.entry(list_id).or_insert(0) += 1;
                }
            }
            _ => match item.owner_id {
                Some(owner_id) => {
                    let slot = owner_slot(&mut owners, &mut owner_index, owner_id);
                    owners[slot].orphans.push(item);
                }
                None => {
                    warn!(item_id = item.id, "Item has neither list nor owner, dropping");
                    stats.items_without_owner += 1;
                }
            },
        }
    }

    if !unreachable.is_empty() {
        let mut by_list: Vec<(i64, u64)> = unreachable.into_iter().collect();
        by_list.sort_unstable();
        for (list_id, count) in by_list {
            warn!(list_id, items = count, "Items reference a list that is not being emitted, dropping");
        }
    }

    GroupedData {
        owners,
        items_by_list,
        stats,
    }
}

/// Find or create the group slot for `owner_id`
fn owner_slot(
    owners: &mut Vec<OwnerGroup>,
    index: &mut HashMap<i64, usize>,
    owner_id: i64,
) -> usize {
    *index.entry(owner_id).or_insert_with(|| {
        owners.push(OwnerGroup {
            owner_id,
            lists: Vec::new(),
            orphans: Vec::new(),
        });
        owners.len() - 1
    })
}
