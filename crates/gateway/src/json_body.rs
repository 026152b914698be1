//! Manual JSON body parsing shared by handlers that need the custom
//! `{"error":"Invalid JSON"}` shape on malformed input — axum's built-in
//! `Json<T>` extractor rejection uses its own status/body, not `ApiError`'s.

use crate::ApiError;
use axum::extract::Request;
use serde::de::DeserializeOwned;

pub async fn parse_json_body<T: DeserializeOwned>(req: Request) -> Result<T, ApiError> {
    let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|_| ApiError::InvalidJson)?;
    serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidJson)
}
