//! Output emission
//!
//! Serializes per-owner output sets into their CSV file trees. Layout
//! per owner directory:
//!
//! - `lists_1.csv`         - primary lists
//! - `new-lists_1.csv`     - synthetic lists created by splitting
//! - `list_items_<id>.csv` - item rows for one emitted list
//! - `no_lists_<n>.csv`    - capped chunks of items with no list
//!
//! Both list files are always written, header-only when empty, so
//! consumers can rely on the set's shape. Integer fields print their
//! value, zero included; only genuinely-unset fields print blank.

pub mod writer;

use crate::emit::writer::CsvFileWriter;
use crate::error::{EmitError, EmitResult};
use crate::normalize::{ItemRecord, ListRecord};
use crate::split::rebalance::OwnerOutput;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Header for lists_1.csv and new-lists_1.csv
pub const LIST_HEADER: [&str; 7] = [
    "list_id",
    "borrower_id",
    "name",
    "description",
    "date_created",
    "date_updated",
    "public_list",
];

/// Header for list_items and no_lists files
pub const ITEM_HEADER: [&str; 3] = ["list_id", "bib_id", "date_added"];

/// Running totals across all emitted files
#[derive(Debug, Default, Clone, Copy)]
pub struct EmitStats {
    pub files_written: u64,
    pub bytes_written: u64,
}

/// Write one owner's complete file set under `out_dir/<owner_id>/`
///
/// Returns false when a shutdown request interrupted the owner between
/// files. Files already persisted stay; nothing is left half-written.
pub fn emit_owner(
    out_dir: &Path,
    output: &OwnerOutput,
    shutdown: &AtomicBool,
    stats: &mut EmitStats,
) -> EmitResult<bool> {
    let owner_dir = out_dir.join(output.owner_id.to_string());
    std::fs::create_dir_all(&owner_dir).map_err(|e| EmitError::CreateDirFailed {
        path: owner_dir.clone(),
        reason: e.to_string(),
    })?;

    write_list_file(
        &owner_dir.join("lists_1.csv"),
        output.primaries.iter().map(|l| &l.record),
        stats,
    )?;
    if shutdown.load(Ordering::Relaxed) {
        return Ok(false);
    }

    write_list_file(
        &owner_dir.join("new-lists_1.csv"),
        output.rebalanced.iter().map(|l| &l.record),
        stats,
    )?;

    for list in output.primaries.iter().chain(output.rebalanced.iter()) {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(false);
        }
        let path = owner_dir.join(format!("list_items_{}.csv", list.record.id));
        write_item_file(&path, &list.items, stats)?;
    }

    for (n, chunk) in output.orphan_chunks.iter().enumerate() {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(false);
        }
        let path = owner_dir.join(format!("no_lists_{}.csv", n + 1));
        write_item_file(&path, chunk, stats)?;
    }

    debug!(owner = output.owner_id, dir = %owner_dir.display(), "Owner file set written");
    Ok(true)
}

fn write_list_file<'a, I>(path: &Path, records: I, stats: &mut EmitStats) -> EmitResult<()>
where
    I: Iterator<Item = &'a ListRecord>,
{
    let mut writer = CsvFileWriter::create(path, &LIST_HEADER)?;
    for record in records {
        writer.write_row(list_row(record))?;
    }
    let rows = writer.rows();
    let bytes = writer.finish()?;
    stats.files_written += 1;
    stats.bytes_written += bytes;
    debug!(path = %path.display(), rows, "List file written");
    Ok(())
}

fn write_item_file(path: &Path, items: &[ItemRecord], stats: &mut EmitStats) -> EmitResult<()> {
    let mut writer = CsvFileWriter::create(path, &ITEM_HEADER)?;
    for item in items {
        writer.write_row(item_row(item))?;
    }
    let rows = writer.rows();
    let bytes = writer.finish()?;
    stats.files_written += 1;
    stats.bytes_written += bytes;
    debug!(path = %path.display(), rows, "Item file written");
    Ok(())
}

/// CSV row for a list record
fn list_row(record: &ListRecord) -> [String; 7] {
    [
        record.id.to_string(),
        opt_int(record.owner_id),
        record.name.clone(),
        record.description.clone(),
        record.created_at.clone(),
        record.updated_at.clone(),
        record.is_public.to_string(),
    ]
}

/// CSV row for an item record
fn item_row(item: &ItemRecord) -> [String; 3] {
    [
        opt_int(item.list_id),
        item.bib_reference.clone(),
        item.added_at.clone(),
    ]
}

/// Unset renders blank; zero renders "0"
fn opt_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::rebalance::EmittedList;
    use tempfile::tempdir;

    fn list_record(id: i64, owner: Option<i64>, name: &str) -> ListRecord {
        ListRecord {
            id,
            owner_id: owner,
            name: name.to_string(),
            description: String::new(),
            created_at: "2024-01-01 00:00:00".to_string(),
            updated_at: "2024-01-02 00:00:00".to_string(),
            is_public: 0,
        }
    }

    fn item_record(id: i64, list_id: Option<i64>) -> ItemRecord {
        ItemRecord {
            id,
            owner_id: Some(7),
            bib_reference: format!("bib-{}", id),
            added_at: "2024-02-01 00:00:00".to_string(),
            list_id,
        }
    }

    fn output_for(owner_id: i64) -> OwnerOutput {
        OwnerOutput {
            owner_id,
            primaries: Vec::new(),
            rebalanced: Vec::new(),
            orphan_chunks: Vec::new(),
            lists_split: 0,
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_emit_writes_both_list_files() {
        let dir = tempdir().unwrap();
        let shutdown = AtomicBool::new(false);
        let mut stats = EmitStats::default();

        let mut output = output_for(7);
        output.primaries.push(EmittedList {
            record: list_record(1, Some(7), "Reading"),
            items: vec![item_record(10, Some(1))],
        });

        assert!(emit_owner(dir.path(), &output, &shutdown, &mut stats).unwrap());

        let owner_dir = dir.path().join("7");
        let lists = read_lines(&owner_dir.join("lists_1.csv"));
        assert_eq!(
            lists[0],
            "list_id,borrower_id,name,description,date_created,date_updated,public_list"
        );
        assert_eq!(lists[1], "1,7,Reading,,2024-01-01 00:00:00,2024-01-02 00:00:00,0");

        // new-lists is still present, header only
        let new_lists = read_lines(&owner_dir.join("new-lists_1.csv"));
        assert_eq!(new_lists.len(), 1);

        let items = read_lines(&owner_dir.join("list_items_1.csv"));
        assert_eq!(items[0], "list_id,bib_id,date_added");
        assert_eq!(items[1], "1,bib-10,2024-02-01 00:00:00");

        assert_eq!(stats.files_written, 3);
        assert!(stats.bytes_written > 0);
    }

    #[test]
    fn test_emit_orphan_chunk_numbering() {
        let dir = tempdir().unwrap();
        let shutdown = AtomicBool::new(false);
        let mut stats = EmitStats::default();

        let mut output = output_for(9);
        output.orphan_chunks = vec![
            vec![item_record(1, None), item_record(2, None)],
            vec![item_record(3, None)],
        ];

        assert!(emit_owner(dir.path(), &output, &shutdown, &mut stats).unwrap());

        let owner_dir = dir.path().join("9");
        assert_eq!(read_lines(&owner_dir.join("no_lists_1.csv")).len(), 3);
        assert_eq!(read_lines(&owner_dir.join("no_lists_2.csv")).len(), 2);
        assert!(!owner_dir.join("no_lists_3.csv").exists());

        // Orphan rows have a blank list_id column
        let rows = read_lines(&owner_dir.join("no_lists_1.csv"));
        assert!(rows[1].starts_with(",bib-1,"));
    }

    #[test]
    fn test_zero_owner_and_zero_ids_render() {
        let dir = tempdir().unwrap();
        let shutdown = AtomicBool::new(false);
        let mut stats = EmitStats::default();

        let mut output = output_for(0);
        output.primaries.push(EmittedList {
            record: list_record(0, Some(0), "Zeroes"),
            items: vec![],
        });

        assert!(emit_owner(dir.path(), &output, &shutdown, &mut stats).unwrap());

        let rows = read_lines(&dir.path().join("0").join("lists_1.csv"));
        assert!(rows[1].starts_with("0,0,Zeroes"));
    }

    #[test]
    fn test_shutdown_stops_between_files() {
        let dir = tempdir().unwrap();
        let shutdown = AtomicBool::new(true);
        let mut stats = EmitStats::default();

        let mut output = output_for(7);
        output.primaries.push(EmittedList {
            record: list_record(1, Some(7), "Reading"),
            items: vec![item_record(10, Some(1))],
        });

        let completed = emit_owner(dir.path(), &output, &shutdown, &mut stats).unwrap();
        assert!(!completed);

        let owner_dir = dir.path().join("7");
        // The first file was already persisted before the flag check
        assert!(owner_dir.join("lists_1.csv").exists());
        assert!(!owner_dir.join("list_items_1.csv").exists());
    }

    #[test]
    fn test_crlf_terminators() {
        let dir = tempdir().unwrap();
        let shutdown = AtomicBool::new(false);
        let mut stats = EmitStats::default();

        let mut output = output_for(7);
        output.primaries.push(EmittedList {
            record: list_record(1, Some(7), "Reading"),
            items: vec![],
        });

        emit_owner(dir.path(), &output, &shutdown, &mut stats).unwrap();

        let bytes = std::fs::read(dir.path().join("7").join("lists_1.csv")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.ends_with("\r\n"));
        assert_eq!(text.matches("\r\n").count(), 2);
    }
}
