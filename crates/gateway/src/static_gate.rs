//! Gated static file serving.
//!
//! A configurable directory is served via `tower_http::services::ServeDir`.
//! Paths in the public set bypass the session check; everything else
//! redirects to `/login.html` (or returns 401 JSON for API clients).

use crate::middleware::{client_ip, wants_json, ADMISSION_LIMIT, ADMISSION_WINDOW};
use crate::{ApiError, SharedState};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use std::net::SocketAddr;
use tower::ServiceExt;

const PUBLIC_PATHS: &[&str] = &["/login.html", "/health", "/favicon.ico", "/styles.css"];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || path.starts_with("/overlay/")
}

/// Shares the admission middleware's rate-limit and session pathway, but
/// deliberately lighter: no bot filter applies to static assets.
pub async fn static_gate(State(state): State<SharedState>, req: Request) -> Response {
    let path = req.uri().path().to_string();

    let remote = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
    let ip = client_ip(req.headers(), remote);
    if !state.rate_limiter.allow(&ip, ADMISSION_LIMIT, ADMISSION_WINDOW) {
        return ApiError::RateLimited.into_response();
    }

    if !is_public(&path) {
        let jar = CookieJar::from_headers(req.headers());
        let session_id = jar.get("vb_session").map(|c| c.value().to_string());
        let wants_json = wants_json(req.headers());
        if state.auth.admit(session_id.as_deref()).await.is_none() {
            return ApiError::Unauthorized { wants_json }.into_response();
        }
    }

    match state.static_service.clone().oneshot(req).await {
        Ok(res) => res.map(axum::body::Body::new).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_bypass_gating() {
        assert!(is_public("/login.html"));
        assert!(is_public("/health"));
        assert!(is_public("/favicon.ico"));
        assert!(is_public("/styles.css"));
        assert!(is_public("/overlay/scoreboard.html"));
        assert!(is_public("/overlay/"));
    }

    #[test]
    fn other_paths_are_gated() {
        assert!(!is_public("/index.html"));
        assert!(!is_public("/api/scout"));
        assert!(!is_public("/overlay"));
    }
}
