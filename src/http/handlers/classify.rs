use axum::Json;
use serde::Deserialize;

use crate::classifier::{classify, Classification};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub code: Option<String>,
    pub message: Option<String>,
}

pub async fn classify_failure(Json(body): Json<ClassifyRequest>) -> Json<Classification> {
    Json(classify(body.code.as_deref(), body.message.as_deref()))
}
