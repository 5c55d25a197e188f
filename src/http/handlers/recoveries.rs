use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::attempt::{AttemptRow, Channel};
use crate::error::EngineError;
use crate::service::recovery::RecoveryLinkOut;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RecoveryLinkRequest {
    pub channel: Option<Channel>,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

fn default_ttl_hours() -> i64 {
    168
}

pub async fn create_link(
    State(state): State<AppState>,
    Path(transaction_ref): Path<String>,
    Json(body): Json<RecoveryLinkRequest>,
) -> Result<(StatusCode, Json<RecoveryLinkOut>), EngineError> {
    let out = state
        .recovery_service
        .create_link(&transaction_ref, body.channel, body.ttl_hours)
        .await?;
    Ok((StatusCode::CREATED, Json(out)))
}

pub async fn list_by_ref(
    State(state): State<AppState>,
    Path(transaction_ref): Path<String>,
) -> Result<Json<Vec<AttemptRow>>, EngineError> {
    let attempts = state.recovery_service.list_by_ref(&transaction_ref).await?;
    Ok(Json(attempts))
}

pub async fn fetch_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<AttemptRow>, EngineError> {
    let attempt = state.recovery_service.fetch_by_token(&token).await?;
    Ok(Json(attempt))
}

pub async fn open_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<AttemptRow>, EngineError> {
    let attempt = state.recovery_service.open_by_token(&token).await?;
    Ok(Json(attempt))
}

pub async fn complete_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<AttemptRow>, EngineError> {
    let attempt = state.recovery_service.complete_by_token(&token).await?;
    Ok(Json(attempt))
}

pub async fn create_payment_handle(
    State(state): State<AppState>,
    Path(transaction_ref): Path<String>,
) -> Result<Json<serde_json::Value>, EngineError> {
    let handle_id = state
        .recovery_service
        .ensure_payment_handle(&transaction_ref)
        .await?;
    Ok(Json(serde_json::json!({ "handle_id": handle_id })))
}
