//! Core types, constants, and pure logic for the CSV product importer.
//!
//! This module does no I/O (no DB, no async, no filesystem). It provides:
//!
//! - Constants for import configuration (batch size, field bounds, boolean tokens).
//! - The [`RawRow`] / [`ProductRow`] types: a record as read from the file and
//!   its parsed, upsert-ready form.
//! - Pure field parsers: price, active flag, SKU normalisation, bounded
//!   truncation, BOM stripping.

use rust_decimal::Decimal;
use std::str::FromStr;

// ── Constants ────────────────────────────────────────────────────────

/// Number of parsed rows buffered before an upsert batch is flushed.
pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// Largest usable flush size. Postgres caps a statement at 65535 bind
/// parameters and the upsert binds six per row, so a batch above ~10.9k
/// rows cannot flush as a single statement.
pub const MAX_CHUNK_SIZE: usize = 10_000;

/// Maximum number of characters kept from the `name` column.
pub const NAME_MAX_CHARS: usize = 512;

/// Tokens (after trim + lowercase) that parse to `active = false`.
pub const FALSE_TOKENS: &[&str] = &["0", "false", "no", "f", "n"];

/// Tokens (after trim + lowercase) that parse to `active = true`.
/// Anything not in either list also parses to `true`.
pub const TRUE_TOKENS: &[&str] = &["1", "true", "yes", "t", "y"];

// ── Types ────────────────────────────────────────────────────────────

/// One raw CSV record, fields as read from the file.
///
/// `None` means the column is absent from the header (or the record is too
/// short to reach it), which is distinct from an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRow<'a> {
    pub sku: Option<&'a str>,
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub price: Option<&'a str>,
    pub active: Option<&'a str>,
}

/// A parsed, upsert-ready product row.
///
/// `sku_lower` is the case-insensitive identity key; `sku` keeps the display
/// form as last seen in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub sku: String,
    pub sku_lower: String,
    pub name: String,
    pub description: String,
    pub price: Option<Decimal>,
    pub active: bool,
}

// ── Field parsers ────────────────────────────────────────────────────

/// Parse a raw record into a [`ProductRow`].
///
/// Returns `None` when the trimmed `sku` is empty: such rows are skipped,
/// never treated as errors. All other fields parse totally:
///
/// - `name`: missing becomes an empty string; truncated to
///   [`NAME_MAX_CHARS`] characters (not trimmed).
/// - `description`: missing becomes an empty string.
/// - `price`: see [`parse_price`].
/// - `active`: see [`parse_active`].
pub fn parse_row(raw: RawRow<'_>) -> Option<ProductRow> {
    let sku = raw.sku.unwrap_or("").trim();
    if sku.is_empty() {
        return None;
    }

    let name = truncate_chars(raw.name.unwrap_or(""), NAME_MAX_CHARS);

    Some(ProductRow {
        sku: sku.to_string(),
        sku_lower: sku.to_lowercase(),
        name: name.to_string(),
        description: raw.description.unwrap_or("").to_string(),
        price: parse_price(raw.price),
        active: parse_active(raw.active),
    })
}

/// Parse a price cell into an exact decimal.
///
/// Trims, strips every comma (thousands separators), then parses. A missing
/// column, blank cell, or unparsable value yields `None` rather than an
/// error. Scientific notation (`1e3`) is accepted as a fallback parse.
pub fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned = trimmed.replace(',', "");
    Decimal::from_str(&cleaned)
        .ok()
        .or_else(|| Decimal::from_scientific(&cleaned).ok())
}

/// Parse an active-flag cell.
///
/// Case-insensitive after trimming. Only the tokens in [`FALSE_TOKENS`]
/// yield `false`; a missing column, blank cell, or unrecognised value all
/// default to `true`.
pub fn parse_active(raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        return true;
    };
    let v = raw.trim().to_lowercase();
    if TRUE_TOKENS.contains(&v.as_str()) {
        true
    } else if FALSE_TOKENS.contains(&v.as_str()) {
        false
    } else {
        true
    }
}

/// Derive the case-insensitive identity key from a display SKU.
pub fn sku_key(sku: &str) -> String {
    sku.trim().to_lowercase()
}

/// Clamp a requested chunk size into `1..=`[`MAX_CHUNK_SIZE`].
///
/// The chunk size arrives through the task payload, so any value is
/// possible; an oversized batch would exceed the statement bind limit and
/// fail the whole job.
pub fn clamp_chunk_size(requested: usize) -> usize {
    requested.clamp(1, MAX_CHUNK_SIZE)
}

/// Truncate a string to at most `max_chars` characters (not bytes), so a
/// multi-byte character is never split.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

/// Strip a leading UTF-8 byte-order mark from a header cell.
///
/// Spreadsheet exports routinely prepend a BOM; after decoding it shows up
/// as U+FEFF glued to the first header name.
pub fn strip_bom(cell: &str) -> &str {
    cell.strip_prefix('\u{feff}').unwrap_or(cell)
}

// ── Tests ────────────────────────────────────────────────────────────
