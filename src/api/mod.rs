pub mod classify;
pub mod health;
pub mod positions;
pub mod summary;
pub mod top_tokens;

use crate::config::Config;
use crate::domain::{Decimal, Mint, RawTradeRecord};
use crate::engine::{aggregate_records, AggregateOptions, Aggregation, Classifier};
use crate::error::AppError;
use crate::ingest::dedup_by_signature;
use axum::{
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use tower_http::cors::{Any, CorsLayer};

/// Immutable per-process state; requests never share positions.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub classifier: Classifier,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let classifier = Classifier::new(config.label_precedence);
        Self { config, classifier }
    }

    fn check_record_limit(&self, count: usize) -> Result<(), AppError> {
        let limit = self.config.max_events_per_request;
        if count > limit {
            return Err(AppError::TooManyRecords { count, limit });
        }
        Ok(())
    }

    /// Dedup, classify and aggregate one request's records.
    pub(crate) fn aggregate(
        &self,
        records: Vec<RawTradeRecord>,
        current_prices: HashMap<String, Decimal>,
    ) -> Result<Aggregation, AppError> {
        self.check_record_limit(records.len())?;
        let options = price_options(current_prices)?;

        let received = records.len();
        let records = dedup_by_signature(records);
        if records.len() < received {
            tracing::debug!(
                duplicates = received - records.len(),
                "dropped duplicate signatures"
            );
        }

        let aggregation = aggregate_records(&records, &self.classifier, &options);
        tracing::info!(
            records = records.len(),
            positions = aggregation.positions.len(),
            rejected = aggregation.rejected.len(),
            "aggregated trade records"
        );
        Ok(aggregation)
    }
}

fn price_options(current_prices: HashMap<String, Decimal>) -> Result<AggregateOptions, AppError> {
    current_prices
        .into_iter()
        .try_fold(AggregateOptions::default(), |options, (mint, price)| {
            let mint = Mint::parse(&mint)
                .map_err(|e| AppError::BadRequest(format!("Invalid mint {:?}: {}", mint, e)))?;
            if price.is_negative() {
                return Err(AppError::BadRequest(format!(
                    "Negative current price for {}",
                    mint
                )));
            }
            Ok(options.with_current_price(mint, price))
        })
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/classify", post(classify::classify_record))
        .route("/v1/positions", post(positions::post_positions))
        .route("/v1/positions/csv", post(positions::post_positions_csv))
        .route("/v1/positions/helius", post(positions::post_positions_helius))
        .route("/v1/summary", post(summary::post_summary))
        .route("/v1/top-tokens", post(top_tokens::post_top_tokens))
        .layer(cors)
        .with_state(state)
}
