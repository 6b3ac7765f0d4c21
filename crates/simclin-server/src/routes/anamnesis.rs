use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

#[derive(Deserialize)]
struct AnamnesisUpdate {
    #[serde(rename = "publicId", alias = "public_id")]
    public_id: String,
    /// Scoring/completion fields forwarded verbatim to the archive.
    #[serde(flatten)]
    fields: Value,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/update-anamnesis", post(update_anamnesis))
}

async fn update_anamnesis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<AnamnesisUpdate>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.anamnesis_token.as_str());
    if !authorized {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid or missing bearer token" })),
        ));
    }

    state
        .archive
        .update_anamnesis(&update.public_id, &update.fields)
        .await
        .map_err(|e| {
            tracing::error!("anamnesis update failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    Ok(Json(json!({ "success": true })))
}
