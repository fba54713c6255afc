//! SQLite source adapter
//!
//! Reads list and item rows directly with rusqlite. The database is
//! opened read-only; this tool never writes to its source.

use crate::error::{SourceError, SourceResult};
use crate::source::{RawItemRow, RawListRow, RawValue};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;
use tracing::info;

/// List rows, aliased to the export column names
const LIST_QUERY: &str = "\
SELECT
    id AS list_id,
    user_id AS borrower_id,
    name,
    description,
    created_at AS date_created,
    modified_at AS date_updated,
    CASE WHEN share_token IS NOT NULL THEN 1 ELSE 0 END AS public_list
FROM lists
ORDER BY id";

/// Item rows with their list association and owner
const ITEM_QUERY: &str = "\
SELECT
    i.id AS item_id,
    i.user_id AS borrower_id,
    i.record_id AS bib_id,
    i.created_at AS date_added,
    il.list_id AS list_id
FROM items i
LEFT JOIN item_lists il ON il.item_id = i.id
ORDER BY i.id";

/// Fetch all rows from a SQLite database file
pub fn fetch_rows(path: &Path) -> SourceResult<(Vec<RawListRow>, Vec<RawItemRow>)> {
    info!(path = %path.display(), "Fetching rows from SQLite");

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
        SourceError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let lists = fetch_lists(&conn)?;
    let items = fetch_items(&conn)?;

    info!(lists = lists.len(), items = items.len(), "SQLite fetch complete");
    Ok((lists, items))
}

fn fetch_lists(conn: &Connection) -> SourceResult<Vec<RawListRow>> {
    let mut stmt = conn.prepare(LIST_QUERY)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawListRow {
                list_id: raw_value(row, 0)?,
                borrower_id: raw_value(row, 1)?,
                name: raw_value(row, 2)?,
                description: raw_value(row, 3)?,
                date_created: raw_value(row, 4)?,
                date_updated: raw_value(row, 5)?,
                public_list: raw_value(row, 6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn fetch_items(conn: &Connection) -> SourceResult<Vec<RawItemRow>> {
    let mut stmt = conn.prepare(ITEM_QUERY)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawItemRow {
                item_id: raw_value(row, 0)?,
                borrower_id: raw_value(row, 1)?,
                bib_id: raw_value(row, 2)?,
                date_added: raw_value(row, 3)?,
                list_id: raw_value(row, 4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Map a column to its source-native representation
fn raw_value(row: &Row, idx: usize) -> rusqlite::Result<RawValue> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => RawValue::Null,
        ValueRef::Integer(n) => RawValue::Integer(n),
        ValueRef::Real(f) => RawValue::Real(f),
        ValueRef::Text(t) => RawValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => RawValue::Text(String::from_utf8_lossy(b).into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;
    use tempfile::tempdir;

    fn seed_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE lists (
                id INTEGER PRIMARY KEY,
                user_id INTEGER,
                name TEXT,
                description TEXT,
                created_at TEXT,
                modified_at TEXT,
                share_token TEXT
            );
            CREATE TABLE items (
                id INTEGER PRIMARY KEY,
                user_id INTEGER,
                record_id TEXT,
                created_at TEXT
            );
            CREATE TABLE item_lists (
                item_id INTEGER,
                list_id INTEGER
            );",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO lists (id, user_id, name, description, created_at, modified_at, share_token)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![1, 7, "Reading", "", "2024-01-01 10:00:00", "2024-01-02 10:00:00", "tok"],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO items (id, user_id, record_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![100, 7, "bib-1", "2024-01-03 09:00:00"],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO item_lists (item_id, list_id) VALUES (?1, ?2)",
            params![100, 1],
        )
        .unwrap();
    }

    #[test]
    fn test_fetch_rows_reads_both_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source.db");
        seed_db(&path);

        let (lists, items) = fetch_rows(&path).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(items.len(), 1);

        assert_eq!(lists[0].list_id, RawValue::Integer(1));
        assert_eq!(lists[0].name, RawValue::Text("Reading".to_string()));
        // share_token present means public
        assert_eq!(lists[0].public_list, RawValue::Integer(1));

        assert_eq!(items[0].item_id, RawValue::Integer(100));
        assert_eq!(items[0].borrower_id, RawValue::Integer(7));
        assert_eq!(items[0].list_id, RawValue::Integer(1));
    }

    #[test]
    fn test_unlinked_item_has_null_list_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source.db");
        seed_db(&path);

        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO items (id, user_id, record_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![101, 9, "bib-2", "2024-01-04 09:00:00"],
        )
        .unwrap();
        drop(conn);

        let (_, items) = fetch_rows(&path).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].list_id, RawValue::Null);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = fetch_rows(Path::new("/no/such/file.db")).unwrap_err();
        assert!(matches!(err, SourceError::OpenFailed { .. }));
    }
}
