//! Performance evaluation over a finished (or finishing) encounter.
//!
//! Unlike the decision agent, failures here are hard errors: silently
//! fabricating feedback would mislead the student.

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use simclin_provider::{LlmMessage, LlmProvider, LlmRequest};
use simclin_schema::{ChatMessage, ClinicalCase, FeedbackResult};

use crate::prompts;
use crate::util::parse_json_output;

const FEEDBACK_TEMPERATURE: f32 = 0.7;
const FEEDBACK_MAX_TOKENS: u32 = 2000;

/// Structured management plan the student may attach for APS scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementPlan {
    #[serde(default)]
    pub derivacion: Option<String>,
    #[serde(default)]
    pub programa: Option<String>,
    #[serde(default)]
    pub indicaciones: Vec<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
}

pub struct FeedbackAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl FeedbackAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn generate(
        &self,
        case: &ClinicalCase,
        history: &[ChatMessage],
        student_diagnosis: &str,
        management_plan: Option<&ManagementPlan>,
    ) -> Result<FeedbackResult> {
        let plan_text = management_plan
            .map(|plan| serde_json::to_string_pretty(plan).unwrap_or_default());
        let request = LlmRequest {
            model: self.model.clone(),
            system: Some(prompts::feedback_system(case.is_aps())),
            messages: vec![LlmMessage::user(prompts::feedback_user(
                case,
                history,
                student_diagnosis,
                plan_text.as_deref(),
            ))],
            max_tokens: FEEDBACK_MAX_TOKENS,
            temperature: Some(FEEDBACK_TEMPERATURE),
            json_mode: true,
        };

        let response = self
            .provider
            .chat(request)
            .await
            .context("feedback completion failed")?;
        let mut feedback: FeedbackResult =
            parse_json_output(&response.text).context("feedback output did not parse")?;

        feedback.puntajes.clamp();
        // manejo only applies to primary-care cases that actually got one
        if !case.is_aps() {
            feedback.manejo = None;
            feedback.puntajes.manejo = None;
        }
        strip_citations_in_place(&mut feedback);
        Ok(feedback)
    }
}

/// Remove retrieval citation markers of the form `【4:0†source】` from all
/// student-facing text.
fn strip_citations_in_place(feedback: &mut FeedbackResult) {
    let re = citation_regex();
    let clean = |s: &mut String| {
        if re.is_match(s) {
            *s = re.replace_all(s, "").into_owned();
        }
    };
    for list in [
        &mut feedback.comentarios.fortalezas,
        &mut feedback.comentarios.debilidades,
        &mut feedback.comentarios.sugerencias,
    ] {
        for item in list.iter_mut() {
            clean(item);
        }
    }
    clean(&mut feedback.diagnostico.comentario);
    if let Some(manejo) = &mut feedback.manejo {
        if let Some(comentario) = &mut manejo.comentario {
            clean(comentario);
        }
        if let Some(recomendado) = &mut manejo.manejo_recomendado {
            clean(recomendado);
        }
    }
}

fn citation_regex() -> Regex {
    Regex::new(r"【\d+:\d+†[^】]*】").expect("citation pattern is valid")
}
