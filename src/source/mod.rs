//! Source adapters
//!
//! Fetches raw list and item rows from the configured database. Two
//! backends: SQLite files read directly through rusqlite, and
//! PostgreSQL fetched through a psql COPY subprocess whose output is
//! parsed as CSV.
//!
//! Rows come back in source-native representation. All coercion is
//! left to the normalizer, so both backends stay thin.

pub mod postgres;
pub mod sqlite;

use crate::config::{ExportConfig, SourceUrl};
use crate::error::SourceResult;

/// A single source-native value
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL NULL or absent column
    Null,
    /// Native integer
    Integer(i64),
    /// Native float
    Real(f64),
    /// Text (everything psql COPY produces)
    Text(String),
}

/// One unnormalized list row
#[derive(Debug, Clone)]
pub struct RawListRow {
    pub list_id: RawValue,
    pub borrower_id: RawValue,
    pub name: RawValue,
    pub description: RawValue,
    pub date_created: RawValue,
    pub date_updated: RawValue,
    pub public_list: RawValue,
}

/// One unnormalized item row
#[derive(Debug, Clone)]
pub struct RawItemRow {
    pub item_id: RawValue,
    pub borrower_id: RawValue,
    pub bib_id: RawValue,
    pub date_added: RawValue,
    pub list_id: RawValue,
}

/// Fetch all list and item rows from the configured source
pub fn fetch_rows(config: &ExportConfig) -> SourceResult<(Vec<RawListRow>, Vec<RawItemRow>)> {
    match &config.source {
        SourceUrl::Sqlite { path } => sqlite::fetch_rows(path),
        SourceUrl::Postgres(pg) => postgres::fetch_rows(pg),
    }
}
