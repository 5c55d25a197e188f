use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

/// Engine-level error taxonomy. Handlers map each variant to an HTTP status;
/// conflicts and duplicate deliveries are deliberately NOT failures to the
/// external caller.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("recovery token expired")]
    TokenExpired,

    #[error("recovery token already used")]
    TokenUsed,

    #[error("operation conflicts with terminal state: {0}")]
    Conflict(String),

    #[error("notification delivery failed: {0}")]
    TransientDelivery(String),

    #[error("integration not configured: {0}")]
    Configuration(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION",
            EngineError::NotFound(_) => "NOT_FOUND",
            EngineError::TokenExpired => "EXPIRED",
            EngineError::TokenUsed => "USED",
            EngineError::Conflict(_) => "CONFLICT",
            EngineError::TransientDelivery(_) => "DELIVERY_FAILED",
            EngineError::Configuration(_) => "NOT_CONFIGURED",
            EngineError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::TokenExpired | EngineError::TokenUsed => StatusCode::GONE,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::TransientDelivery(_) => StatusCode::BAD_GATEWAY,
            EngineError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.code().to_string(),
                message: self.to_string(),
                details: None,
            },
        }
    }
}

impl axum::response::IntoResponse for EngineError {
    fn into_response(self) -> axum::response::Response {
        if matches!(self, EngineError::Internal(_)) {
            tracing::error!(error = %self, "internal error");
        }
        (self.status(), axum::Json(self.envelope())).into_response()
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        EngineError::Internal(e.into())
    }
}
