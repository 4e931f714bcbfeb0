//! ISO-8601 timestamps as written into store files
//!
//! Timestamps are local time without offset, with microsecond precision
//! (`2026-10-17T09:30:00.123456`). The fixed width keeps lexical order equal
//! to chronological order, which `list_versions` relies on.

use chrono::{DateTime, NaiveDateTime};

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const ISO_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format a local time for storage
#[inline]
#[must_use]
pub fn format_iso(at: NaiveDateTime) -> String {
    at.format(ISO_FORMAT).to_string()
}

/// Parse a stored timestamp
///
/// Accepts the stored format with or without fractional seconds, and
/// RFC 3339 strings carrying an offset (the offset is dropped, keeping the
/// wall-clock reading).
#[must_use]
pub fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, ISO_PARSE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}
