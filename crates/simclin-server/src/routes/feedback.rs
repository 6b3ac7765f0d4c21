use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use simclin_agents::ManagementPlan;

use crate::routes::engine_error_response;
use crate::state::AppState;

#[derive(Deserialize)]
struct FeedbackRequest {
    #[serde(rename = "simulationId")]
    simulation_id: String,
    #[serde(rename = "managementPlan", default)]
    management_plan: Option<ManagementPlan>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/feedback", post(generate))
}

/// Deferred feedback: re-score an existing simulation, optionally with
/// the student's structured management plan.
async fn generate(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let feedback = state
        .engine
        .generate_feedback(&request.simulation_id, request.management_plan.as_ref())
        .await
        .map_err(engine_error_response)?;
    Ok(Json(json!({ "success": true, "feedback": feedback })))
}
