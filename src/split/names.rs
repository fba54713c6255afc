//! Sibling-name disambiguation
//!
//! Every name an owner's emitted lists use passes through one
//! registry, so chunk numbering and duplicate-name suffixes can never
//! collide with each other. Chunk names are claimed first, during
//! rebalancing; primary names are then deduplicated against the
//! merged set.

use crate::normalize::{truncate_with_suffix, MAX_NAME_LEN};
use crate::split::rebalance::EmittedList;
use std::collections::{HashMap, HashSet};

/// Per-owner registry of claimed list names
#[derive(Debug, Default)]
pub struct NameRegistry {
    taken: HashSet<String>,
    counters: HashMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next numbered variant of `base`: "<base> (<n>)" with
    /// a per-base counter starting at 1, skipping names already taken.
    /// The base is truncated if needed so the result stays within the
    /// name length cap; the numbering suffix survives verbatim.
    pub fn next_numbered_name(&mut self, base: &str) -> String {
        loop {
            let counter = self.counters.entry(base.to_string()).or_insert(0);
            *counter += 1;
            let suffix = format!(" ({})", counter);
            let candidate = truncate_with_suffix(base, &suffix, MAX_NAME_LEN);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Claim `name` as-is. Returns false if it was already taken.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_string())
    }

    /// Whether `name` has been claimed
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

/// Rename primary lists so no two of an owner's emitted lists share a
/// name. Members of a duplicated name get numbered suffixes in source
/// order; a primary whose name collides with an already-claimed chunk
/// name is renamed the same way.
pub fn dedupe_primary_names(primaries: &mut [EmittedList], names: &mut NameRegistry) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for list in primaries.iter() {
        *counts.entry(list.record.name.trim().to_string()).or_insert(0) += 1;
    }

    for list in primaries.iter_mut() {
        let base = list.record.name.trim().to_string();
        let duplicated = counts.get(&base).copied().unwrap_or(0) > 1;
        if duplicated || names.is_taken(&base) {
            list.record.name = names.next_numbered_name(&base);
        } else {
            names.reserve(&base);
            list.record.name = base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::ListRecord;

    fn emitted(name: &str) -> EmittedList {
        EmittedList {
            record: ListRecord {
                id: 1,
                owner_id: Some(1),
                name: name.to_string(),
                description: String::new(),
                created_at: String::new(),
                updated_at: String::new(),
                is_public: 0,
            },
            items: Vec::new(),
        }
    }

    #[test]
    fn test_numbered_names_count_up() {
        let mut names = NameRegistry::new();
        assert_eq!(names.next_numbered_name("Reading"), "Reading (1)");
        assert_eq!(names.next_numbered_name("Reading"), "Reading (2)");
        assert_eq!(names.next_numbered_name("Other"), "Other (1)");
    }

    #[test]
    fn test_numbered_names_skip_taken() {
        let mut names = NameRegistry::new();
        names.reserve("Reading (2)");
        assert_eq!(names.next_numbered_name("Reading"), "Reading (1)");
        assert_eq!(names.next_numbered_name("Reading"), "Reading (3)");
    }

    #[test]
    fn test_numbered_name_truncates_long_base() {
        let mut names = NameRegistry::new();
        let base = "b".repeat(300);
        let name = names.next_numbered_name(&base);
        assert_eq!(name.chars().count(), MAX_NAME_LEN);
        assert!(name.ends_with(" (1)"));
    }

    #[test]
    fn test_dedupe_renames_every_duplicate() {
        let mut names = NameRegistry::new();
        let mut primaries = vec![emitted("Favorites"), emitted("Favorites"), emitted("Other")];
        dedupe_primary_names(&mut primaries, &mut names);

        assert_eq!(primaries[0].record.name, "Favorites (1)");
        assert_eq!(primaries[1].record.name, "Favorites (2)");
        assert_eq!(primaries[2].record.name, "Other");
    }

    #[test]
    fn test_dedupe_respects_chunk_claims() {
        let mut names = NameRegistry::new();
        // Chunk names claimed during rebalancing
        names.next_numbered_name("Reading");
        names.next_numbered_name("Reading");

        let mut primaries = vec![emitted("Reading (2)")];
        dedupe_primary_names(&mut primaries, &mut names);
        assert_eq!(primaries[0].record.name, "Reading (2) (1)");
    }

    #[test]
    fn test_dedupe_keeps_unique_singleton() {
        let mut names = NameRegistry::new();
        names.next_numbered_name("Reading");

        // "Reading" itself was never claimed, only "Reading (1)"
        let mut primaries = vec![emitted("Reading")];
        dedupe_primary_names(&mut primaries, &mut names);
        assert_eq!(primaries[0].record.name, "Reading");
    }
}
