use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use simclin_schema::{ChatMessage, ChatRole, ClinicalCase, PatientContext};

use crate::state::AppState;

/// Legacy direct patient-chat path: the client owns the case and the
/// history, the server only produces the next in-character reply.
#[derive(Deserialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    #[serde(rename = "clinicalCase")]
    clinical_case: ClinicalCase,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let last_user = request
        .messages
        .iter()
        .rposition(|m| m.role == ChatRole::User)
        .ok_or((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "messages must contain a user message" })),
        ))?;

    let reply = state
        .patient
        .respond(
            &request.clinical_case,
            &PatientContext::standard(),
            &request.messages[..last_user],
            &request.messages[last_user].content,
        )
        .await
        .map_err(|e| {
            tracing::error!("legacy chat failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    Ok(Json(json!({ "message": reply.content })))
}
