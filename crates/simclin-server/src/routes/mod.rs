pub mod anamnesis;
pub mod cases;
pub mod chat;
pub mod engine;
pub mod exams;
pub mod feedback;
pub mod images;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use simclin_engine::EngineError;

use crate::state::AppState;

pub fn api_router() -> axum::Router<AppState> {
    axum::Router::new()
        .merge(cases::router())
        .merge(chat::router())
        .merge(engine::router())
        .merge(exams::router())
        .merge(feedback::router())
        .merge(anamnesis::router())
        .nest("/images", images::router())
}

/// Map an engine error onto its REST status. Variant-matched, no message
/// sniffing.
pub(crate) fn engine_error_response(err: EngineError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        EngineError::SimulationNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::SimulationNotActive(_) => StatusCode::BAD_REQUEST,
        EngineError::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("engine operation failed: {err}");
    }
    (status, Json(json!({ "success": false, "error": err.to_string() })))
}
