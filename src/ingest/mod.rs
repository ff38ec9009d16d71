//! Pure parsers that turn upstream shapes into [`RawTradeRecord`]s.
//!
//! No network I/O happens here: callers fetch payloads however they like
//! and hand the bytes or JSON over.

pub mod csv;
pub mod helius;

use crate::domain::RawTradeRecord;
use std::collections::HashSet;
use thiserror::Error;

pub use self::csv::{parse_trade_csv, parse_trade_csv_file, CsvImport, SkippedRow};
pub use self::helius::{
    normalize_transaction, normalize_transactions, parse_webhook_payload, HeliusTransaction,
};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv parse error: {0}")]
    Csv(String),
    #[error("json parse error: {0}")]
    Json(String),
}

/// Drop records whose signature was already seen; the first occurrence
/// wins. Records without a signature are always kept.
pub fn dedup_by_signature(records: Vec<RawTradeRecord>) -> Vec<RawTradeRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| match record.signature.as_deref().map(str::trim) {
            Some(sig) if !sig.is_empty() => seen.insert(sig.to_string()),
            _ => true,
        })
        .collect()
}
