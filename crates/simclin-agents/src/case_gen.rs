//! Clinical case generation: direct completion or the APS
//! retrieval-augmented path with graceful fallback.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use simclin_provider::{LlmProvider, LlmRequest};
use simclin_schema::{CaseOptions, ClinicalCase};

use crate::prompts;
use crate::util::parse_json_output;
use crate::RagAssistant;

/// Direct generation runs hot to maximize case variety.
const GENERATION_TEMPERATURE: f32 = 1.0;
const GENERATION_MAX_TOKENS: u32 = 3000;

/// Fixed APS subcategory pool the engine draws from when none is given.
pub const APS_SUBCATEGORIES: [&str; 5] = [
    "cardiovascular",
    "respiratorio",
    "diabetes",
    "salud_mental",
    "musculoesqueletico",
];

pub struct CaseGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    assistant: Option<Arc<dyn RagAssistant>>,
}

impl CaseGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            assistant: None,
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn RagAssistant>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Generate a case. APS cases go through the document-grounded
    /// assistant when one is configured; any assistant failure falls
    /// back to the direct completion path.
    pub async fn generate(&self, options: &CaseOptions) -> Result<ClinicalCase> {
        let is_aps = options.especialidad.trim().eq_ignore_ascii_case("aps");

        if is_aps {
            if let Some(assistant) = &self.assistant {
                let prompt = prompts::case_generation(
                    &options.especialidad,
                    &options.nivel_dificultad,
                    options.aps_subcategoria.as_deref(),
                    &variety_seed(),
                );
                match assistant.ask(&prompt).await {
                    Ok(raw) => match finalize_case(&raw, options) {
                        Ok(case) => return Ok(case),
                        Err(e) => {
                            tracing::warn!("assistant case unusable, falling back to direct generation: {e}");
                        }
                    },
                    Err(e) => {
                        tracing::warn!("assistant case generation failed, falling back to direct generation: {e}");
                    }
                }
            }
        }

        let prompt = prompts::case_generation(
            &options.especialidad,
            &options.nivel_dificultad,
            options.aps_subcategoria.as_deref(),
            &variety_seed(),
        );
        let request = LlmRequest::simple(self.model.clone(), None, prompt)
            .with_temperature(GENERATION_TEMPERATURE)
            .with_max_tokens(GENERATION_MAX_TOKENS)
            .with_json_mode();

        let response = self
            .provider
            .chat(request)
            .await
            .context("case generation completion failed")?;
        finalize_case(&response.text, options)
    }
}

/// Parse, shape-check, stamp and sanitize a generated case.
fn finalize_case(raw: &str, options: &CaseOptions) -> Result<ClinicalCase> {
    let mut case: ClinicalCase =
        parse_json_output(raw).context("generated case was incomplete: unparseable JSON")?;

    if case.paciente.nombre.trim().is_empty() {
        bail!("generated case was incomplete: missing paciente");
    }
    if case.motivo_consulta.trim().is_empty() {
        bail!("generated case was incomplete: missing motivo_consulta");
    }

    if case.id.trim().is_empty() {
        case.id = format!("caso_{}", chrono::Utc::now().timestamp_millis());
    }
    // the request, not the model, owns the classification
    case.especialidad = options.especialidad.clone();
    case.nivel_dificultad = options.nivel_dificultad.clone();
    if case.aps_subcategoria.is_none() {
        case.aps_subcategoria = options.aps_subcategoria.clone();
    }
    case.examen_fisico.signos_vitales.clamp();
    Ok(case)
}

fn variety_seed() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}
