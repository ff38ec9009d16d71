use crate::api::AppState;
use crate::engine::LabelPrecedence;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Readiness plus the limits this instance enforces.
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    let precedence = match state.config.label_precedence {
        LabelPrecedence::Trusted => "trusted",
        LabelPrecedence::FlowFirst => "flow",
    };
    Json(json!({
        "status": "ready",
        "labelPrecedence": precedence,
        "maxEventsPerRequest": state.config.max_events_per_request,
    }))
}
