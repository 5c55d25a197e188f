use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::domain::transaction::ReconSummary;
use crate::error::EngineError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReconQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    30
}

pub async fn run(
    State(state): State<AppState>,
    Query(query): Query<ReconQuery>,
) -> Result<Json<ReconSummary>, EngineError> {
    if query.days <= 0 || query.days > 365 {
        return Err(EngineError::Validation(
            "days must be between 1 and 365".to_string(),
        ));
    }
    let summary = state.reconciliation.run(query.days).await?;
    Ok(Json(summary))
}
