use crate::json_body::parse_json_body;
use crate::middleware::{client_ip, wants_json};
use crate::{ApiError, SharedState};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

const SESSION_COOKIE: &str = "vb_session";
const LOGIN_LIMIT: usize = 5;
const LOGIN_WINDOW: Duration = Duration::from_secs(60);
const SESSION_MAX_AGE: i64 = 60 * 60 * 24 * 30; // 30 days, matching courtrelay_session::SESSION_LIFETIME

#[derive(Deserialize)]
pub struct LoginRequest {
    pin: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    success: bool,
    authenticated: bool,
    expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct SimpleResponse {
    success: bool,
}

#[derive(Serialize)]
pub struct SessionResponse {
    authenticated: bool,
    expires_at: chrono::DateTime<chrono::Utc>,
}

fn session_cookie(id: &str, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(::time::Duration::seconds(max_age_seconds))
        .build()
}

pub async fn login(
    State(state): State<SharedState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let remote = req.extensions().get::<ConnectInfo<SocketAddr>>().map(|ci| ci.0);
    let ip = client_ip(req.headers(), remote);

    if !state.rate_limiter.allow(&format!("{ip}:login"), LOGIN_LIMIT, LOGIN_WINDOW) {
        return Err(ApiError::LoginRateLimited);
    }

    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let jar = CookieJar::from_headers(req.headers());
    let request: LoginRequest = parse_json_body(req).await?;

    let session = state
        .auth
        .login(&request.pin, &user_agent, &ip)
        .await
        .ok_or(ApiError::Unauthorized { wants_json: true })?;

    let jar = jar.add(session_cookie(&session.id, SESSION_MAX_AGE));
    let body = Json(LoginResponse {
        success: true,
        authenticated: true,
        expires_at: session.expires_at,
    });
    Ok((jar, body))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> impl IntoResponse {
    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    state.auth.logout(session_id.as_deref()).await;

    let jar = jar.add(session_cookie("", -1));
    (jar, Json(SimpleResponse { success: true }))
}

pub async fn session_probe(
    State(state): State<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let session = state
        .auth
        .admit(session_id.as_deref())
        .await
        .ok_or(ApiError::Unauthorized { wants_json: wants_json(&headers) })?;

    Ok(Json(SessionResponse {
        authenticated: true,
        expires_at: session.expires_at,
    }))
}
