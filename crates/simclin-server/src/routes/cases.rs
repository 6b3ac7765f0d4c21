use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use simclin_schema::{CaseOptions, ClinicalCase};

use crate::state::AppState;

#[derive(Deserialize)]
struct LoadQuery {
    public_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generar-caso", post(generate_case))
        .route("/cargar-caso", get(load_case))
}

/// Generate a case and register its simulation in one step. The full
/// case (diagnosis included) goes back to the caller; the stored
/// simulation already carries the patient's greeting.
async fn generate_case(
    State(state): State<AppState>,
    Json(options): Json<CaseOptions>,
) -> Result<Json<ClinicalCase>, (StatusCode, Json<Value>)> {
    let created = state.engine.create_simulation(&options).await.map_err(|e| {
        tracing::error!("case generation failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;
    Ok(Json(created.simulation.case))
}

async fn load_case(
    State(state): State<AppState>,
    Query(query): Query<LoadQuery>,
) -> Result<Json<ClinicalCase>, (StatusCode, Json<Value>)> {
    match state.archive.load_case(&query.public_id).await {
        Ok(Some(case)) => Ok(Json(case)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("case not found: {}", query.public_id) })),
        )),
        Err(e) => {
            tracing::error!("archive lookup failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            ))
        }
    }
}
