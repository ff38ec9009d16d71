use crate::api::AppState;
use crate::domain::decimal::{deserialize_price_map, lenient};
use crate::domain::{Address, Decimal, RawTradeRecord};
use crate::engine::{Aggregation, Position, RejectedRecord, TradeHistoryEntry};
use crate::error::AppError;
use crate::ingest::{self, parse_trade_csv};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsRequest {
    pub records: Vec<RawTradeRecord>,
    #[serde(default, deserialize_with = "deserialize_price_map")]
    pub current_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeliusPositionsRequest {
    pub wallet: String,
    #[serde(default, with = "lenient::option")]
    pub sol_price_usd: Option<Decimal>,
    /// Webhook body as delivered: an array, a single transaction, or a
    /// `{"transaction": ...}` wrapper.
    pub transactions: serde_json::Value,
    #[serde(default, deserialize_with = "deserialize_price_map")]
    pub current_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsResponse {
    pub positions: Vec<PositionDto>,
    pub rejected: Vec<RejectedDto>,
}

impl From<Aggregation> for PositionsResponse {
    fn from(aggregation: Aggregation) -> Self {
        PositionsResponse {
            positions: aggregation
                .positions
                .values()
                .map(PositionDto::from)
                .collect(),
            rejected: aggregation.rejected.into_iter().map(RejectedDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub wallet: String,
    pub token_mint: String,
    pub token_symbol: String,
    pub total_bought: String,
    pub total_sold: String,
    pub total_buy_value_usd: String,
    pub total_sell_value_usd: String,
    pub buy_count: u32,
    pub sell_count: u32,
    pub average_entry_price: String,
    pub average_exit_price: String,
    pub remaining_tokens: String,
    pub is_fully_sold: bool,
    pub current_price_usd: String,
    pub market_cap_usd: Option<String>,
    /// `null` when the cost basis is unknown.
    pub realized_pnl_usd: Option<String>,
    pub unrealized_pnl_usd: String,
    pub total_pnl_usd: String,
    pub realized_pnl_pct: Option<String>,
    pub unrealized_pnl_pct: Option<String>,
    pub total_pnl_pct: Option<String>,
    pub cost_basis_unknown: bool,
    pub negative_balance: bool,
    pub first_trade_time: i64,
    pub first_buy_time: Option<i64>,
    pub last_sell_time: Option<i64>,
    pub trades: Vec<TradeDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    pub signature: String,
    pub direction: &'static str,
    pub token_amount: String,
    pub unit_price_usd: String,
    pub value_usd: String,
    pub pnl_usd: Option<String>,
    pub block_time: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedDto {
    pub index: usize,
    pub signature: Option<String>,
    pub reason: String,
}

fn canonical(value: Decimal) -> String {
    value.to_canonical_string()
}

impl From<&Position> for PositionDto {
    fn from(p: &Position) -> Self {
        PositionDto {
            wallet: p.wallet.as_str().to_string(),
            token_mint: p.token_mint.as_str().to_string(),
            token_symbol: p.token_symbol.as_str().to_string(),
            total_bought: canonical(p.total_bought),
            total_sold: canonical(p.total_sold),
            total_buy_value_usd: canonical(p.total_buy_value_usd),
            total_sell_value_usd: canonical(p.total_sell_value_usd),
            buy_count: p.buy_count,
            sell_count: p.sell_count,
            average_entry_price: canonical(p.average_entry_price),
            average_exit_price: canonical(p.average_exit_price),
            remaining_tokens: canonical(p.remaining_tokens),
            is_fully_sold: p.is_fully_sold,
            current_price_usd: canonical(p.current_price_usd),
            market_cap_usd: p.market_cap_usd.map(canonical),
            realized_pnl_usd: p.realized_pnl().map(canonical),
            unrealized_pnl_usd: canonical(p.unrealized_pnl_usd),
            total_pnl_usd: canonical(p.total_pnl_usd),
            realized_pnl_pct: p.realized_pnl_pct.map(canonical),
            unrealized_pnl_pct: p.unrealized_pnl_pct.map(canonical),
            total_pnl_pct: p.total_pnl_pct.map(canonical),
            cost_basis_unknown: p.cost_basis_unknown,
            negative_balance: p.negative_balance,
            first_trade_time: p.first_trade_time.as_secs(),
            first_buy_time: p.first_buy_time.map(|t| t.as_secs()),
            last_sell_time: p.last_sell_time.map(|t| t.as_secs()),
            trades: p.trades.iter().map(TradeDto::from).collect(),
        }
    }
}

impl From<&TradeHistoryEntry> for TradeDto {
    fn from(t: &TradeHistoryEntry) -> Self {
        TradeDto {
            signature: t.signature.clone(),
            direction: t.direction.as_str(),
            token_amount: canonical(t.token_amount),
            unit_price_usd: canonical(t.unit_price_usd),
            value_usd: canonical(t.value_usd),
            pnl_usd: t.pnl_usd.map(canonical),
            block_time: t.block_time.as_secs(),
        }
    }
}

impl From<RejectedRecord> for RejectedDto {
    fn from(r: RejectedRecord) -> Self {
        RejectedDto {
            index: r.index,
            signature: r.signature,
            reason: r.reason,
        }
    }
}

pub async fn post_positions(
    State(state): State<AppState>,
    Json(body): Json<PositionsRequest>,
) -> Result<Json<PositionsResponse>, AppError> {
    let aggregation = state.aggregate(body.records, body.current_prices)?;
    Ok(Json(aggregation.into()))
}

/// Body is a CSV export with a header row. Unreadable rows are reported in
/// `rejected` with their line number as the index.
pub async fn post_positions_csv(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PositionsResponse>, AppError> {
    let import = parse_trade_csv(&body)?;
    let aggregation = state.aggregate(import.records, HashMap::new())?;

    let mut response = PositionsResponse::from(aggregation);
    response
        .rejected
        .extend(import.skipped.into_iter().map(|row| RejectedDto {
            index: row.line as usize,
            signature: None,
            reason: row.reason,
        }));
    Ok(Json(response))
}

pub async fn post_positions_helius(
    State(state): State<AppState>,
    Json(body): Json<HeliusPositionsRequest>,
) -> Result<Json<PositionsResponse>, AppError> {
    let wallet = Address::parse(&body.wallet)
        .map_err(|e| AppError::BadRequest(format!("Invalid wallet: {}", e)))?;
    if body.sol_price_usd.is_some_and(|p| p.is_negative()) {
        return Err(AppError::BadRequest("solPriceUsd must be >= 0".to_string()));
    }

    let transactions = ingest::parse_webhook_payload(&body.transactions)?;
    state.check_record_limit(transactions.len())?;
    let records =
        ingest::normalize_transactions(&transactions, wallet.as_str(), body.sol_price_usd);

    let aggregation = state.aggregate(records, body.current_prices)?;
    Ok(Json(aggregation.into()))
}
