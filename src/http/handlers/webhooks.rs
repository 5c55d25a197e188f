use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use crate::error::EngineError;
use crate::service::ingestor::IngestOutcome;
use crate::AppState;

const SIGNATURE_HEADERS: [&str; 3] = ["x-webhook-signature", "stripe-signature", "x-razorpay-signature"];

/// Processor callback entry point. Duplicate deliveries are acknowledged with
/// success so the processor stops redelivering.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, EngineError> {
    let signature = SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok());

    let outcome = state.ingestor.ingest(&body, signature).await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "outcome": outcome,
        "idempotent": outcome == IngestOutcome::AlreadyProcessed,
    })))
}
