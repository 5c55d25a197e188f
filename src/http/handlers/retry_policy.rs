use axum::extract::{Path, State};
use axum::Json;

use crate::error::EngineError;
use crate::repo::retry_policy_repo::RetryPolicy;
use crate::AppState;

pub async fn get_retry_policy(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
) -> Result<Json<RetryPolicy>, EngineError> {
    let policy = state.retry_policy_repo.active_for_org(org_id).await?;
    Ok(Json(policy))
}

pub async fn upsert_retry_policy(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
    Json(mut policy): Json<RetryPolicy>,
) -> Result<Json<serde_json::Value>, EngineError> {
    if policy.max_retries < 0 || policy.initial_delay_minutes <= 0 || policy.max_delay_minutes <= 0 {
        return Err(EngineError::Validation(
            "retry policy delays and budget must be positive".to_string(),
        ));
    }
    if policy.backoff_multiplier < 1.0 {
        return Err(EngineError::Validation(
            "backoff_multiplier must be >= 1".to_string(),
        ));
    }
    policy.org_id = org_id;
    state.retry_policy_repo.upsert(policy).await?;
    Ok(Json(serde_json::json!({ "updated": true })))
}
