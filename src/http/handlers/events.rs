use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::domain::transaction::{FailureEventIn, FailureEventRow};
use crate::error::EngineError;
use crate::AppState;

pub async fn payment_failed(
    State(state): State<AppState>,
    Json(payload): Json<FailureEventIn>,
) -> Result<(StatusCode, Json<FailureEventRow>), EngineError> {
    let event = state.failure_intake.ingest(payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list_by_ref(
    State(state): State<AppState>,
    Path(transaction_ref): Path<String>,
) -> Result<Json<Vec<FailureEventRow>>, EngineError> {
    let events = state.failure_intake.list_by_ref(&transaction_ref).await?;
    Ok(Json(events))
}
