use crate::json_body::parse_json_body;
use crate::{ApiError, SharedState};
use axum::extract::{Request, State};
use axum::Json;
use courtrelay_store::ScoutPayload;
use serde::Serialize;

#[derive(Serialize)]
pub struct VersionResponse {
    version: i64,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
}

pub async fn get(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(state.scout.get().await).unwrap())
}

pub async fn update(
    State(state): State<SharedState>,
    req: Request,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: ScoutPayload = parse_json_body(req).await?;
    let updated = state.scout.update(payload).await?;
    state
        .hub
        .broadcast(format!(r#"{{"type":"scout_update","version":{}}}"#, updated.version))
        .await;
    Ok(Json(serde_json::to_value(updated).unwrap()))
}

pub async fn version(State(state): State<SharedState>) -> Json<VersionResponse> {
    let doc = state.scout.get().await;
    Json(VersionResponse {
        version: doc.version,
        timestamp: doc.last_updated,
    })
}

pub async fn archive(State(state): State<SharedState>) -> Result<Json<StatusResponse>, ApiError> {
    state.scout.archive(&state.config.archive_dir()).await?;
    Ok(Json(StatusResponse { status: "ok" }))
}
