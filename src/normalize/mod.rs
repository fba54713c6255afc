//! Field normalization
//!
//! Pure per-row coercion from source-native values into canonical
//! records. Every rule degrades instead of failing: a bad integer
//! becomes 0, an unparseable timestamp passes through lightly cleaned,
//! an unknown flag token becomes 0. This stage never errors, so one
//! dirty row can never abort an export.

pub mod pool;

use crate::source::{RawItemRow, RawListRow, RawValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Canonical timestamp output format
const DATE_OUTPUT_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Maximum characters kept in a list name
pub const MAX_NAME_LEN: usize = 255;

/// Maximum characters kept in a list description
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// Timestamp patterns carrying a UTC offset
const ZONED_PATTERNS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Naive date and time patterns (no offset)
const NAIVE_PATTERNS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// Date-only patterns, rendered at midnight
const DATE_PATTERNS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// A normalized list row
#[derive(Debug, Clone, PartialEq)]
pub struct ListRecord {
    pub id: i64,
    /// None when the source row carries no owner at all
    pub owner_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    /// Always 0 or 1
    pub is_public: i64,
}

/// A normalized item row
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: i64,
    /// None when the source row carries no owner at all
    pub owner_id: Option<i64>,
    pub bib_reference: String,
    pub added_at: String,
    /// None when the source row carries no list association
    pub list_id: Option<i64>,
}

/// Normalize one raw list row. Never fails.
pub fn normalize_list(row: &RawListRow) -> ListRecord {
    let name = truncate_with_suffix(&coerce_text(&row.name), "", MAX_NAME_LEN);
    let description = clamp_chars(&coerce_text(&row.description), MAX_DESCRIPTION_LEN);
    ListRecord {
        id: coerce_int(&row.list_id),
        owner_id: coerce_opt_int(&row.borrower_id),
        name,
        description,
        created_at: coerce_datetime(&row.date_created),
        updated_at: coerce_datetime(&row.date_updated),
        is_public: coerce_bool(&row.public_list),
    }
}

/// Normalize one raw item row. Never fails.
pub fn normalize_item(row: &RawItemRow) -> ItemRecord {
    ItemRecord {
        id: coerce_int(&row.item_id),
        owner_id: coerce_opt_int(&row.borrower_id),
        bib_reference: coerce_text(&row.bib_id),
        added_at: coerce_datetime(&row.date_added),
        list_id: coerce_opt_int(&row.list_id),
    }
}

/// Parse an integer, defaulting to 0 on anything unparseable
pub fn coerce_int(value: &RawValue) -> i64 {
    match value {
        RawValue::Null => 0,
        RawValue::Integer(n) => *n,
        RawValue::Real(f) => *f as i64,
        RawValue::Text(s) => s.trim().parse::<i64>().unwrap_or(0),
    }
}

/// Like [`coerce_int`], but preserves "genuinely unset": NULL and
/// blank text map to None instead of 0
pub fn coerce_opt_int(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Null => None,
        RawValue::Text(s) if s.trim().is_empty() => None,
        other => Some(coerce_int(other)),
    }
}

/// Map a boolean-like value onto 0 or 1
pub fn coerce_bool(value: &RawValue) -> i64 {
    match value {
        RawValue::Null => 0,
        RawValue::Integer(n) => i64::from(*n != 0),
        RawValue::Real(f) => i64::from(*f != 0.0),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "y" | "yes" | "on" => 1,
            _ => 0,
        },
    }
}

/// Text fields are trimmed; NULL becomes empty
pub fn coerce_text(value: &RawValue) -> String {
    match value {
        RawValue::Null => String::new(),
        RawValue::Integer(n) => n.to_string(),
        RawValue::Real(f) => f.to_string(),
        RawValue::Text(s) => s.trim().to_string(),
    }
}

/// Canonicalize a timestamp to UTC "YYYY-MM-DD HH:MM:SS"
///
/// Tries zoned patterns first (converted to UTC), then naive ones,
/// then date-only (rendered at midnight), then RFC 3339. A value none
/// of them match passes through with a single 'T' separator replaced
/// by a space.
pub fn coerce_datetime(value: &RawValue) -> String {
    let raw = match value {
        RawValue::Null => return String::new(),
        RawValue::Integer(n) => n.to_string(),
        RawValue::Real(f) => f.to_string(),
        RawValue::Text(s) => s.trim().to_string(),
    };
    if raw.is_empty() {
        return String::new();
    }

    // %z wants a numeric offset, so rewrite a trailing Z first
    let candidate = match raw.strip_suffix('Z') {
        Some(prefix) => format!("{}+0000", prefix),
        None => raw.clone(),
    };

    for pattern in ZONED_PATTERNS {
        if let Ok(dt) = DateTime::parse_from_str(&candidate, pattern) {
            return dt.with_timezone(&Utc).format(DATE_OUTPUT_FMT).to_string();
        }
    }
    for pattern in NAIVE_PATTERNS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&candidate, pattern) {
            return dt.format(DATE_OUTPUT_FMT).to_string();
        }
    }
    for pattern in DATE_PATTERNS {
        if let Ok(date) = NaiveDate::parse_from_str(&candidate, pattern) {
            return format!("{} 00:00:00", date.format("%Y-%m-%d"));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return dt.with_timezone(&Utc).format(DATE_OUTPUT_FMT).to_string();
    }

    raw.replacen('T', " ", 1)
}

/// Append `suffix` to `base`, truncating the base (and any trailing
/// whitespace the cut exposes) so the result stays within `max_len`
/// characters. The suffix is always preserved verbatim.
pub fn truncate_with_suffix(base: &str, suffix: &str, max_len: usize) -> String {
    let base_len = base.chars().count();
    let suffix_len = suffix.chars().count();
    if base_len + suffix_len <= max_len {
        return format!("{}{}", base, suffix);
    }
    let keep = max_len.saturating_sub(suffix_len);
    let cut: String = base.chars().take(keep).collect();
    format!("{}{}", cut.trim_end(), suffix)
}

/// Truncate to at most `max_len` characters
fn clamp_chars(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        s.chars().take(max_len).collect()
    }
}
