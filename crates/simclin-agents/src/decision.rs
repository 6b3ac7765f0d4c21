//! Message intent classification.
//!
//! The classification intelligence lives in the model call; the only real
//! code-level logic here is the pair of deterministic overrides and the
//! advisory keyword pre-filters, which is why those are plain functions
//! unit-tested without a provider.

use std::sync::Arc;

use serde::Deserialize;
use simclin_provider::{LlmMessage, LlmProvider, LlmRequest};
use simclin_schema::{ChatMessage, ClinicalCase, DecisionAction, DecisionResult, ExamRequest};

use crate::prompts;
use crate::util::parse_json_output;

const DECISION_TEMPERATURE: f32 = 0.3;
const DECISION_MAX_TOKENS: u32 = 500;
/// Turns of prior conversation shown to the classifier.
const HISTORY_WINDOW: usize = 6;

const DEFAULT_REASONING: &str =
    "acción no reconocida; se continúa la conversación con el paciente";
const QUESTION_OVERRIDE_REASONING: &str =
    "el mensaje contiene una pregunta: se trata como hipótesis, no como diagnóstico final";

const DIAGNOSIS_KEYWORDS: [&str; 6] = [
    "mi diagnóstico",
    "mi diagnostico",
    "el diagnóstico es",
    "el diagnostico es",
    "se trata de",
    "el paciente tiene",
];

const END_PHRASES: [&str; 5] = [
    "terminar la simulación",
    "terminar la simulacion",
    "finalizar la sesión",
    "finalizar la sesion",
    "quiero salir",
];

pub struct DecisionAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

/// Loose shape of the model's JSON so a half-formed answer still yields
/// whatever fields it did produce.
#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    action: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    extracted_diagnosis: Option<String>,
    #[serde(default)]
    exam_request: Option<ExamRequest>,
}

impl DecisionAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Classify one student message. Never fails: any provider or parse
    /// error degrades to `patient_interaction` so the conversation keeps
    /// moving.
    pub async fn classify(
        &self,
        message: &str,
        history: &[ChatMessage],
        case: Option<&ClinicalCase>,
    ) -> DecisionResult {
        let window_start = history.len().saturating_sub(HISTORY_WINDOW);
        let request = LlmRequest {
            model: self.model.clone(),
            system: Some(prompts::decision_system()),
            messages: vec![LlmMessage::user(prompts::decision_user(
                message,
                &history[window_start..],
                case,
            ))],
            max_tokens: DECISION_MAX_TOKENS,
            temperature: Some(DECISION_TEMPERATURE),
            json_mode: true,
        };

        let raw = match self.provider.chat(request).await {
            Ok(response) => response.text,
            Err(e) => {
                tracing::warn!("decision agent degraded to patient_interaction: {e}");
                return DecisionResult::patient_interaction(format!(
                    "clasificación no disponible ({e}); se continúa la conversación"
                ));
            }
        };

        let parsed: RawDecision = match parse_json_output(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("decision agent output unparseable: {e}");
                return DecisionResult::patient_interaction(DEFAULT_REASONING);
            }
        };

        apply_overrides(message, parsed)
    }
}

/// The deterministic guardrails on top of the model's answer.
fn apply_overrides(message: &str, raw: RawDecision) -> DecisionResult {
    let Some(action) = DecisionAction::parse(&raw.action) else {
        return DecisionResult::patient_interaction(DEFAULT_REASONING);
    };

    // A question is a hypothesis, never a final diagnosis.
    if action == DecisionAction::SubmitDiagnosis && contains_question_mark(message) {
        return DecisionResult::patient_interaction(QUESTION_OVERRIDE_REASONING);
    }

    DecisionResult {
        action,
        reasoning: raw.reasoning,
        extracted_diagnosis: raw.extracted_diagnosis,
        exam_request: raw.exam_request,
    }
}

pub fn contains_question_mark(message: &str) -> bool {
    message.contains('?') || message.contains('¿')
}

/// Advisory pre-filter: looks like a diagnosis submission. The model
/// call remains authoritative.
pub fn is_likely_diagnosis_submission(message: &str) -> bool {
    if contains_question_mark(message) {
        return false;
    }
    let lowered = message.to_lowercase();
    DIAGNOSIS_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Advisory pre-filter: looks like a session termination request.
pub fn is_likely_end_simulation(message: &str) -> bool {
    let lowered = message.to_lowercase();
    END_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}
