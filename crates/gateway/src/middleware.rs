use crate::error::ApiError;
use crate::SharedState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;

pub(crate) const ADMISSION_LIMIT: usize = 100;
pub(crate) const ADMISSION_WINDOW: std::time::Duration = std::time::Duration::from_secs(60);

/// `X-Forwarded-For` (first hop), else `X-Real-IP`, else the transport
/// remote address.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return forwarded.to_string();
    }
    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
    {
        return real_ip.to_string();
    }
    remote
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Full admission middleware for `/api/scout*` and `/api/matchday*`:
/// rate limit, bot filter, session cookie check, touch, then `next`.
pub async fn protect(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let remote = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
    let ip = client_ip(req.headers(), remote);

    if !state.rate_limiter.allow(&ip, ADMISSION_LIMIT, ADMISSION_WINDOW) {
        return Err(ApiError::RateLimited);
    }

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if courtrelay_botfilter::is_bot(user_agent) {
        return Err(ApiError::BotRejected);
    }

    let jar = axum_extra::extract::CookieJar::from_headers(req.headers());
    let session_id = jar.get("vb_session").map(|c| c.value().to_string());
    let wants_json = wants_json(req.headers());

    if state.auth.admit(session_id.as_deref()).await.is_none() {
        return Err(ApiError::Unauthorized { wants_json });
    }

    Ok(next.run(req).await)
}
