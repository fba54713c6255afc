//! PostgreSQL source adapter
//!
//! Shells out to the psql client and streams each query through
//! `COPY (...) TO STDOUT WITH CSV HEADER`, the same way operators pull
//! these exports by hand. The psql binary must be on PATH; no native
//! driver is linked. Every value arrives as text and the normalizer
//! takes it from there.

use crate::config::PostgresConfig;
use crate::error::{SourceError, SourceResult};
use crate::source::{RawItemRow, RawListRow, RawValue};
use csv::StringRecord;
use std::io::ErrorKind;
use std::process::Command;
use tracing::{debug, info};

/// List rows; the REGEXP_REPLACE collapses comma and whitespace runs
/// in names server-side before normalization sees them
const LIST_QUERY: &str = "\
SELECT
    id AS list_id,
    user_id AS borrower_id,
    REGEXP_REPLACE(name, '[,\\s]+', ' ', 'g') AS name,
    description,
    created_at AS date_created,
    modified_at AS date_updated,
    (share_token IS NOT NULL) AS public_list
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

/// Column layout expected back from the list COPY
const LIST_COLUMNS: [&str; 7] = [
    "list_id",
    "borrower_id",
    "name",
    "description",
    "date_created",
    "date_updated",
    "public_list",
];

/// Column layout expected back from the item COPY
const ITEM_COLUMNS: [&str; 5] = ["item_id", "borrower_id", "bib_id", "date_added", "list_id"];

/// Fetch all rows through the psql client
pub fn fetch_rows(pg: &PostgresConfig) -> SourceResult<(Vec<RawListRow>, Vec<RawItemRow>)> {
    info!(host = %pg.host, database = %pg.database, "Fetching rows from PostgreSQL via psql");

    let (pos, records) = run_copy_query(pg, LIST_QUERY, &LIST_COLUMNS)?;
    let lists = records
        .iter()
        .map(|r| RawListRow {
            list_id: field(r, pos[0]),
            borrower_id: field(r, pos[1]),
            name: field(r, pos[2]),
            description: field(r, pos[3]),
            date_created: field(r, pos[4]),
            date_updated: field(r, pos[5]),
            public_list: field(r, pos[6]),
        })
        .collect::<Vec<_>>();

    let (pos, records) = run_copy_query(pg, ITEM_QUERY, &ITEM_COLUMNS)?;
    let items = records
        .iter()
        .map(|r| RawItemRow {
            item_id: field(r, pos[0]),
            borrower_id: field(r, pos[1]),
            bib_id: field(r, pos[2]),
            date_added: field(r, pos[3]),
            list_id: field(r, pos[4]),
        })
        .collect::<Vec<_>>();

    info!(lists = lists.len(), items = items.len(), "PostgreSQL fetch complete");
    Ok((lists, items))
}

/// Run one COPY query and return the positions of the requested
/// columns plus every data record
fn run_copy_query(
    pg: &PostgresConfig,
    select: &str,
    columns: &[&str],
) -> SourceResult<(Vec<usize>, Vec<StringRecord>)> {
    let copy_sql = format!("COPY ({}) TO STDOUT WITH CSV HEADER", select);
    debug!(database = %pg.database, "Running psql COPY");

    let mut cmd = Command::new("psql");
    cmd.arg("-h")
        .arg(&pg.host)
        .arg("-p")
        .arg(pg.port.to_string())
        .arg("-d")
        .arg(&pg.database)
        .arg("-c")
        .arg(&copy_sql);
    if let Some(user) = &pg.user {
        cmd.arg("-U").arg(user);
    }
    if let Some(password) = &pg.password {
        cmd.env("PGPASSWORD", password);
    }

    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound => SourceError::PsqlNotFound,
        _ => SourceError::PsqlSpawnFailed(e.to_string()),
    })?;

    if !output.status.success() {
        return Err(SourceError::PsqlFailed {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_copy_output(&output.stdout, columns)
}

/// Parse CSV COPY output and resolve the requested column positions
fn parse_copy_output(
    stdout: &[u8],
    columns: &[&str],
) -> SourceResult<(Vec<usize>, Vec<StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(stdout);

    let headers = reader.headers()?.clone();
    let positions = columns
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == *name)
                .ok_or_else(|| SourceError::MissingColumn {
                    column: (*name).to_string(),
                })
        })
        .collect::<SourceResult<Vec<_>>>()?;

    let records = reader.records().collect::<Result<Vec<_>, csv::Error>>()?;
    debug!(rows = records.len(), "psql COPY parsed");
    Ok((positions, records))
}

/// A missing field (short record) maps to NULL; everything else is text
fn field(record: &StringRecord, idx: usize) -> RawValue {
    match record.get(idx) {
        None => RawValue::Null,
        Some(s) => RawValue::Text(s.to_string()),
    }
}
