use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use simclin_schema::{FeedbackResult, RequestedExam};

use crate::routes::engine_error_response;
use crate::state::AppState;

#[derive(Deserialize)]
struct EngineRequest {
    #[serde(rename = "simulationId")]
    simulation_id: String,
    message: String,
}

#[derive(Serialize)]
struct EngineResponse {
    success: bool,
    data: EngineData,
}

#[derive(Serialize)]
struct EngineData {
    #[serde(rename = "actionTaken")]
    action_taken: &'static str,
    reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<FeedbackResult>,
    #[serde(rename = "requestedExams")]
    requested_exams: Vec<RequestedExam>,
    timestamp: DateTime<Utc>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/engine", post(process))
}

async fn process(
    State(state): State<AppState>,
    Json(request): Json<EngineRequest>,
) -> Result<Json<EngineResponse>, (StatusCode, Json<Value>)> {
    let outcome = state
        .engine
        .process_message(&request.simulation_id, &request.message)
        .await
        .map_err(engine_error_response)?;

    Ok(Json(EngineResponse {
        success: true,
        data: EngineData {
            action_taken: outcome.action.as_str(),
            reasoning: outcome.reasoning,
            response: outcome.response,
            feedback: outcome.feedback,
            requested_exams: outcome.requested_exams,
            timestamp: outcome.timestamp,
        },
    }))
}
