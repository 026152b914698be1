use crate::json_body::parse_json_body;
use crate::{ApiError, SharedState};
use axum::extract::{Query, Request, State};
use axum::Json;
use courtrelay_store::MatchdayPayload;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct ParseQuery {
    url: String,
}

pub async fn get(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(state.matchday.get().await).unwrap())
}

pub async fn update(
    State(state): State<SharedState>,
    req: Request,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: MatchdayPayload = parse_json_body(req).await?;
    let updated = state.matchday.update(payload).await?;
    let data = serde_json::to_value(&updated.payload).unwrap();
    state
        .hub
        .broadcast(
            serde_json::json!({
                "type": "matchday_update",
                "version": updated.version,
                "data": data,
            })
            .to_string(),
        )
        .await;
    Ok(Json(serde_json::to_value(updated).unwrap()))
}

pub async fn parse(
    State(state): State<SharedState>,
    Query(query): Query<ParseQuery>,
) -> Result<Json<MatchdayPayload>, ApiError> {
    let doc = state.matchday.parse_external(&query.url).await?;
    Ok(Json(doc))
}
