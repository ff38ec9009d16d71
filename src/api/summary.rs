use crate::api::positions::RejectedDto;
use crate::api::AppState;
use crate::domain::decimal::deserialize_price_map;
use crate::domain::{Address, Decimal, RawTradeRecord};
use crate::engine::{summarize_wallet, WalletSummary};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub wallet: String,
    pub records: Vec<RawTradeRecord>,
    #[serde(default, deserialize_with = "deserialize_price_map")]
    pub current_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub wallet: String,
    pub total_positions: usize,
    pub open_positions: usize,
    pub closed_positions: usize,
    pub unknown_basis_positions: usize,
    pub total_realized_pnl_usd: String,
    pub total_unrealized_pnl_usd: String,
    pub total_pnl_usd: String,
    pub win_rate_pct: Option<String>,
    pub rejected: Vec<RejectedDto>,
}

impl SummaryResponse {
    fn new(summary: WalletSummary, rejected: Vec<RejectedDto>) -> Self {
        SummaryResponse {
            wallet: summary.wallet.as_str().to_string(),
            total_positions: summary.total_positions,
            open_positions: summary.open_positions,
            closed_positions: summary.closed_positions,
            unknown_basis_positions: summary.unknown_basis_positions,
            total_realized_pnl_usd: summary.total_realized_pnl_usd.to_canonical_string(),
            total_unrealized_pnl_usd: summary.total_unrealized_pnl_usd.to_canonical_string(),
            total_pnl_usd: summary.total_pnl_usd.to_canonical_string(),
            win_rate_pct: summary
                .win_rate_pct
                .map(|pct| pct.round_dp(2).to_canonical_string()),
            rejected,
        }
    }
}

pub async fn post_summary(
    State(state): State<AppState>,
    Json(body): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, AppError> {
    let wallet = Address::parse(&body.wallet)
        .map_err(|e| AppError::BadRequest(format!("Invalid wallet: {}", e)))?;

    let aggregation = state.aggregate(body.records, body.current_prices)?;
    let summary = summarize_wallet(&wallet, aggregation.positions.values());
    let rejected = aggregation
        .rejected
        .into_iter()
        .map(RejectedDto::from)
        .collect();

    Ok(Json(SummaryResponse::new(summary, rejected)))
}
