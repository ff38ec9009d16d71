//! CSV exports of the transactions table.

use super::ImportError;
use crate::domain::{Decimal, RawTradeRecord};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// A data row that could not be read; 1-based line number including the
/// header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvImport {
    pub records: Vec<RawTradeRecord>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default, alias = "transaction_signature")]
    signature: Option<String>,
    #[serde(default, alias = "from_address")]
    wallet: Option<String>,
    #[serde(default)]
    token_mint: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default, alias = "transaction_type", alias = "direction_hint")]
    source_type: Option<String>,
    #[serde(default, alias = "amount")]
    token_amount: Option<String>,
    #[serde(default)]
    sol_amount: Option<String>,
    #[serde(default)]
    native_balance_change: Option<String>,
    #[serde(default, alias = "current_token_price", alias = "unit_price_usd")]
    price_usd: Option<String>,
    #[serde(default)]
    block_time: Option<String>,
    #[serde(default, alias = "market_cap")]
    market_cap_usd: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn decimal_field(value: Option<String>, field: &str) -> Result<Option<Decimal>, String> {
    non_empty(value)
        .map(|s| {
            Decimal::parse_lenient(&s).map_err(|e| format!("invalid {} {:?}: {}", field, s, e))
        })
        .transpose()
}

impl Row {
    fn into_record(self) -> Result<RawTradeRecord, String> {
        Ok(RawTradeRecord {
            signature: non_empty(self.signature),
            wallet: non_empty(self.wallet),
            token_mint: non_empty(self.token_mint),
            token_symbol: non_empty(self.token_symbol),
            source_type: non_empty(self.source_type),
            token_amount: decimal_field(self.token_amount, "token_amount")?,
            sol_amount: decimal_field(self.sol_amount, "sol_amount")?,
            native_balance_change: decimal_field(
                self.native_balance_change,
                "native_balance_change",
            )?,
            price_usd: decimal_field(self.price_usd, "price_usd")?,
            block_time: non_empty(self.block_time),
            market_cap_usd: decimal_field(self.market_cap_usd, "market_cap_usd")?,
        })
    }
}

/// Parse CSV bytes with a header row. Rows that fail to parse are skipped
/// and reported; required-field checks are left to aggregation.
pub fn parse_trade_csv(bytes: &[u8]) -> Result<CsvImport, ImportError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(bytes);

    // A header that cannot be read means the whole file is unusable.
    let headers = reader
        .headers()
        .map_err(|e| ImportError::Csv(e.to_string()))?
        .clone();

    let mut import = CsvImport::default();
    for result in reader.records() {
        let (line, parsed) = match result {
            Ok(record) => (
                record.position().map(|p| p.line()).unwrap_or(0),
                record
                    .deserialize::<Row>(Some(&headers))
                    .map_err(|e| e.to_string())
                    .and_then(Row::into_record),
            ),
            Err(e) => (e.position().map(|p| p.line()).unwrap_or(0), Err(e.to_string())),
        };

        match parsed {
            Ok(record) => import.records.push(record),
            Err(reason) => {
                warn!(line, "skipping csv row: {}", reason);
                import.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    Ok(import)
}

pub fn parse_trade_csv_file(path: impl AsRef<Path>) -> Result<CsvImport, ImportError> {
    let bytes = std::fs::read(path)?;
    parse_trade_csv(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_parse_export_columns() {
        let csv = "transaction_signature,from_address,token_mint,token_symbol,transaction_type,amount,sol_amount,current_token_price,block_time\n\
                   sig1,wallet1,mint1,BONK,SWAP,1000,-1.5,0.000012345678901234,2024-04-24T23:06:40Z\n\
                   sig2,wallet1,mint1,BONK,SELL,-400,,,1714000100\n";
        let import = parse_trade_csv(csv.as_bytes()).unwrap();
        assert!(import.skipped.is_empty());
        assert_eq!(import.records.len(), 2);

        let first = &import.records[0];
        assert_eq!(first.signature.as_deref(), Some("sig1"));
        assert_eq!(first.source_type.as_deref(), Some("SWAP"));
        assert_eq!(first.token_amount, Some(d("1000")));
        assert_eq!(first.sol_amount, Some(d("-1.5")));
        // Full precision is kept.
        assert_eq!(first.price_usd, Some(d("0.000012345678901234")));

        let second = &import.records[1];
        assert_eq!(second.sol_amount, None);
        assert_eq!(second.price_usd, None);
        assert_eq!(second.block_time.as_deref(), Some("1714000100"));
    }

    #[test]
    fn test_parse_alternate_column_names() {
        let csv = "signature,wallet,token_mint,direction_hint,token_amount,unit_price_usd,market_cap,block_time\n\
                   s1,w,m,BUY,10,0.5,2500000,1714000000\n";
        let import = parse_trade_csv(csv.as_bytes()).unwrap();
        assert!(import.skipped.is_empty());

        let record = &import.records[0];
        assert_eq!(record.source_type.as_deref(), Some("BUY"));
        assert_eq!(record.price_usd, Some(d("0.5")));
        assert_eq!(record.market_cap_usd, Some(d("2500000")));
    }

    #[test]
    fn test_bad_numeric_row_is_skipped_not_fatal() {
        let csv = "signature,wallet,token_mint,token_amount,block_time\n\
                   a,w,m,12,1\n\
                   b,w,m,twelve,2\n\
                   c,w,m,7,3\n";
        let import = parse_trade_csv(csv.as_bytes()).unwrap();
        assert_eq!(import.records.len(), 2);
        assert_eq!(import.skipped.len(), 1);
        assert_eq!(import.skipped[0].line, 3);
        assert!(import.skipped[0].reason.contains("token_amount"));
    }

    #[test]
    fn test_missing_columns_become_none() {
        let csv = "signature,wallet\nabc,w1\n";
        let import = parse_trade_csv(csv.as_bytes()).unwrap();
        assert_eq!(import.records.len(), 1);
        assert_eq!(import.records[0].token_mint, None);
        assert_eq!(import.records[0].block_time, None);
    }

    #[test]
    fn test_parse_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "signature,wallet,token_mint,token_amount,sol_amount,block_time").unwrap();
        writeln!(file, "s1,w,m,10,-0.1,100").unwrap();
        file.flush().unwrap();

        let import = parse_trade_csv_file(file.path()).unwrap();
        assert_eq!(import.records.len(), 1);
        assert_eq!(import.records[0].sol_amount, Some(d("-0.1")));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse_trade_csv_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ImportError::Io(_)));
    }
}
