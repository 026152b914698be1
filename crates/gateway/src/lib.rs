//! HTTP surface for the relay: auth endpoints, versioned-state endpoints,
//! the WebSocket upgrade, and a session-gated static file server.
//!
//! Business logic lives in the component crates (`courtrelay-auth`,
//! `courtrelay-store`, `courtrelay-hub`, …); this crate wires them
//! together behind Axum routes, applies CORS and security headers, and
//! owns the process entry point.

mod error;
mod json_body;
mod middleware;
mod routes;
mod static_gate;
mod ws;

pub use error::ApiError;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use courtrelay_auth::AuthService;
use courtrelay_config::RelayConfig;
use courtrelay_core::{RelayClock, SystemClock};
use courtrelay_hub::HubHandle;
use courtrelay_ratelimit::RateLimiter;
use courtrelay_session::SessionStore;
use courtrelay_store::{MatchdayStore, ScoutStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Everything a request handler might need, shared across the process.
pub struct AppState {
    pub config: RelayConfig,
    pub clock: Arc<dyn RelayClock>,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth: Arc<AuthService>,
    pub scout: Arc<ScoutStore>,
    pub matchday: Arc<MatchdayStore>,
    pub hub: HubHandle,
    pub static_service: ServeDir,
}

pub type SharedState = Arc<AppState>;

/// Assemble the router: public routes, the session-gated `/api` surface,
/// the WS upgrade, and the static-file fallback — wrapped in CORS, the
/// fixed security headers, and HTTP tracing.
pub fn build_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route(
            "/scout",
            get(routes::scout::get)
                .post(routes::scout::update)
                .fallback(method_not_allowed),
        )
        .route(
            "/scout/version",
            get(routes::scout::version).fallback(method_not_allowed),
        )
        .route(
            "/scout/archive",
            post(routes::scout::archive).fallback(method_not_allowed),
        )
        .route(
            "/matchday",
            get(routes::matchday::get)
                .post(routes::matchday::update)
                .fallback(method_not_allowed),
        )
        .route(
            "/matchday/parse",
            get(routes::matchday::parse).fallback(method_not_allowed),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::protect,
        ));

    let api = Router::new()
        .route(
            "/auth/login",
            post(routes::auth::login).fallback(method_not_allowed),
        )
        .route(
            "/auth/logout",
            post(routes::auth::logout).fallback(method_not_allowed),
        )
        .route(
            "/auth/session",
            get(routes::auth::session_probe).fallback(method_not_allowed),
        )
        .merge(protected);

    let cors = build_cors_layer(&state.config.allowed_origins);

    Router::new()
        .route(
            "/health",
            get(routes::health).fallback(method_not_allowed),
        )
        .route("/ws", get(ws::ws_handler).fallback(method_not_allowed))
        .nest("/api", api)
        .fallback(static_gate::static_gate)
        .layer(axum::middleware::from_fn(security_headers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Used as the per-route fallback for any method not explicitly registered
/// on that path, so a matched path with the wrong method reports the same
/// JSON error shape as every other rejected request.
async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// The four security headers applied to every response.
async fn security_headers(req: axum::extract::Request, next: axum::middleware::Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-xss-protection"),
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response
}

/// Build every component crate's state from `config` and start serving.
pub async fn start(config: RelayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let clock: Arc<dyn RelayClock> = Arc::new(SystemClock);

    let rate_limiter = Arc::new(RateLimiter::new(clock.clone()));
    courtrelay_ratelimit::spawn_sweeper(rate_limiter.clone());

    let sessions = Arc::new(SessionStore::load(config.sessions_path(), clock.clone()));
    courtrelay_session::spawn_sweeper(sessions.clone());

    let auth = Arc::new(AuthService::new(config.pin.clone(), sessions));
    let scout = Arc::new(ScoutStore::load(config.scout_path(), clock.clone()));
    let matchday = Arc::new(MatchdayStore::load(config.matchday_path(), clock.clone()));
    let hub = courtrelay_hub::spawn_hub();
    let static_service = ServeDir::new(&config.static_dir);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();

    let state: SharedState = Arc::new(AppState {
        config,
        clock,
        rate_limiter,
        auth,
        scout,
        matchday,
        hub,
        static_service,
    });

    let app = build_router(state);

    info!(%addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
