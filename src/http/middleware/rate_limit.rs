use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use redis::AsyncCommands;

/// Fixed-window per-IP counter for the public token endpoints. The counter
/// lives in Redis because independent workers share no memory; when Redis is
/// unreachable the limiter fails open and only logs.
#[derive(Clone)]
pub struct RateLimitState {
    pub redis_client: redis::Client,
    pub max_per_minute: i64,
}

pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string();

    let window = chrono::Utc::now().timestamp() / 60;
    let key = format!("recovery:rl:{client_ip}:{window}");

    match state.redis_client.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let count: i64 = conn.incr(&key, 1).await.unwrap_or(1);
            if count == 1 {
                let _: bool = conn.expire(&key, 120).await.unwrap_or(false);
            }
            if count > state.max_per_minute {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(serde_json::json!({"error": {"code": "RATE_LIMITED", "message": "too many requests"}})),
                )
                    .into_response();
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "rate limiter unavailable, failing open");
        }
    }

    next.run(request).await
}
