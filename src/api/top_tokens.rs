use crate::api::AppState;
use crate::domain::decimal::deserialize_price_map;
use crate::domain::{Decimal, RawTradeRecord};
use crate::engine::{top_tokens, TokenPerformance};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTokensRequest {
    pub records: Vec<RawTradeRecord>,
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "deserialize_price_map")]
    pub current_prices: HashMap<String, Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTokensResponse {
    pub tokens: Vec<TokenPerformanceDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPerformanceDto {
    pub token_mint: String,
    pub token_symbol: String,
    pub wallet_count: usize,
    pub trade_count: u32,
    pub total_pnl_usd: String,
}

impl From<TokenPerformance> for TokenPerformanceDto {
    fn from(t: TokenPerformance) -> Self {
        TokenPerformanceDto {
            token_mint: t.token_mint.as_str().to_string(),
            token_symbol: t.token_symbol.as_str().to_string(),
            wallet_count: t.wallet_count,
            trade_count: t.trade_count,
            total_pnl_usd: t.total_pnl_usd.to_canonical_string(),
        }
    }
}

pub async fn post_top_tokens(
    State(state): State<AppState>,
    Json(body): Json<TopTokensRequest>,
) -> Result<Json<TopTokensResponse>, AppError> {
    let limit = body.limit.unwrap_or(state.config.top_tokens_limit);
    if limit == 0 {
        return Err(AppError::BadRequest("limit must be > 0".to_string()));
    }

    let aggregation = state.aggregate(body.records, body.current_prices)?;
    let tokens = top_tokens(aggregation.positions.values(), limit)
        .into_iter()
        .map(TokenPerformanceDto::from)
        .collect();

    Ok(Json(TopTokensResponse { tokens }))
}
