use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::AppState;

/// In-process fallback runner for local/dev setups without the worker
/// binary. Gated by the FALLBACK_RETRY_RUNNER flag.
pub async fn trigger_due(State(state): State<AppState>) -> impl IntoResponse {
    if !state.fallback_retry_runner {
        return (
            StatusCode::PRECONDITION_FAILED,
            Json(serde_json::json!({"error": "FALLBACK_RETRY_RUNNER disabled"})),
        )
            .into_response();
    }

    let due = match state.scheduler.scan_due(100).await {
        Ok(due) => due,
        Err(e) => return e.into_response(),
    };

    let mut processed = 0usize;
    for attempt in &due {
        // Individual delivery failures are already logged and re-armed by the
        // backoff cadence; the pass keeps going.
        if state.dispatcher.dispatch(attempt).await.is_ok() {
            processed += 1;
        }
    }

    let expired = state.scheduler.expire_sweep().await.unwrap_or(0);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "found": due.len(),
            "processed": processed,
            "expired": expired,
        })),
    )
        .into_response()
}
