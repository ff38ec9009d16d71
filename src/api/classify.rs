use crate::api::AppState;
use crate::domain::decimal::lenient;
use crate::domain::Decimal;
use crate::engine::Classification;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    #[serde(default, with = "lenient::option")]
    pub sol_delta: Option<Decimal>,
    #[serde(default, with = "lenient::option")]
    pub token_delta: Option<Decimal>,
    pub source_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    /// "BUY", "SELL" or "UNCLASSIFIED".
    pub classification: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Classification> for ClassifyResponse {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Classified(direction) => ClassifyResponse {
                classification: direction.as_str(),
                reason: None,
            },
            Classification::Unclassified(reason) => ClassifyResponse {
                classification: "UNCLASSIFIED",
                reason: Some(reason.to_string()),
            },
        }
    }
}

pub async fn classify_record(
    State(state): State<AppState>,
    Json(body): Json<ClassifyRequest>,
) -> Json<ClassifyResponse> {
    let classification = state.classifier.classify(
        body.sol_delta.unwrap_or_default(),
        body.token_delta.unwrap_or_default(),
        body.source_type.as_deref(),
    );
    Json(classification.into())
}
