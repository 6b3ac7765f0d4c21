use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use simclin_agents::ExamOutcome;
use simclin_schema::ExamRequest;

use crate::state::AppState;

/// Standalone exam resolution, outside any stored simulation.
#[derive(Deserialize)]
struct GenerateExamRequest {
    tipo: String,
    #[serde(default)]
    clasificacion: Option<String>,
    #[serde(default)]
    subclasificacion: Option<String>,
    #[serde(default)]
    diagnostico: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generar-examen", post(generate_exam))
}

async fn generate_exam(
    State(state): State<AppState>,
    Json(request): Json<GenerateExamRequest>,
) -> Json<ExamOutcome> {
    let exam_request = ExamRequest {
        tipo: request.tipo,
        clasificacion: request.clasificacion,
        subclasificacion: request.subclasificacion,
    };
    let outcome = state
        .exam
        .process_with_diagnosis(&exam_request, request.diagnostico.as_deref());
    Json(outcome)
}
