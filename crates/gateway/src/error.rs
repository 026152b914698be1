use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    InvalidJson,
    RateLimited,
    LoginRateLimited,
    BotRejected,
    Unauthorized { wants_json: bool },
    Storage,
    Fetch(String),
    UpstreamStatus(u16),
    MethodNotAllowed,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct LoginRateLimitedBody {
    success: bool,
    message: String,
}

/// A `302 Found` redirect. `axum::response::Redirect` has no constructor for
/// this status (`to` is 303, `temporary` is 307, `permanent` is 308), so the
/// response is built by hand to match the documented status code exactly.
fn found(location: &'static str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_static(location));
    response
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidJson => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: "Invalid JSON".into() }))
                    .into_response()
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody { error: "Rate limit exceeded".into() }),
            )
                .into_response(),
            ApiError::LoginRateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(LoginRateLimitedBody {
                    success: false,
                    message: "Too many login attempts, try again later".into(),
                }),
            )
                .into_response(),
            ApiError::BotRejected => (
                StatusCode::FORBIDDEN,
                Json(ErrorBody { error: "Forbidden".into() }),
            )
                .into_response(),
            ApiError::Unauthorized { wants_json } => {
                if wants_json {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(ErrorBody { error: "Unauthorized".into() }),
                    )
                        .into_response()
                } else {
                    found("/login.html")
                }
            }
            ApiError::Storage => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: "Failed to save state".into() }),
            )
                .into_response(),
            ApiError::Fetch(cause) => {
                tracing::warn!(cause = %cause, "matchday fetch failed");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorBody { error: "fetch failed".into() }),
                )
                    .into_response()
            }
            ApiError::UpstreamStatus(status) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: format!("upstream returned {status}"),
                }),
            )
                .into_response(),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(ErrorBody { error: "Method not allowed".into() }),
            )
                .into_response(),
        }
    }
}

impl From<courtrelay_store::StoreError> for ApiError {
    fn from(err: courtrelay_store::StoreError) -> Self {
        match err {
            courtrelay_store::StoreError::Persist(_) => ApiError::Storage,
            courtrelay_store::StoreError::Fetch(cause) => ApiError::Fetch(cause),
            courtrelay_store::StoreError::UpstreamStatus(status) => {
                ApiError::UpstreamStatus(status)
            }
        }
    }
}
