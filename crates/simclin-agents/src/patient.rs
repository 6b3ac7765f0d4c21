//! The in-character simulated patient.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use simclin_provider::{LlmMessage, LlmProvider, LlmRequest};
use simclin_schema::{ChatMessage, ChatRole, ClinicalCase, PatientContext};

use crate::prompts;

const GREETING_TEMPERATURE: f32 = 0.7;
const RESPONSE_TEMPERATURE: f32 = 0.8;
const GREETING_MAX_TOKENS: u32 = 200;
const RESPONSE_MAX_TOKENS: u32 = 400;

const FALLBACK_GREETING: &str =
    "Buenos días, doctor. Vengo porque no me he sentido bien últimamente.";

pub struct PatientAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl PatientAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Opening utterance for a fresh simulation. Never fails the caller:
    /// on provider error a canned greeting is returned.
    pub async fn initial_greeting(
        &self,
        case: &ClinicalCase,
        context: &PatientContext,
    ) -> String {
        let request = LlmRequest {
            model: self.model.clone(),
            system: Some(prompts::patient_system(case, context)),
            messages: vec![LlmMessage::user(prompts::greeting_instruction(case))],
            max_tokens: GREETING_MAX_TOKENS,
            temperature: Some(GREETING_TEMPERATURE),
            json_mode: false,
        };
        match self.provider.chat(request).await {
            Ok(response) if !response.text.trim().is_empty() => response.text,
            Ok(_) => FALLBACK_GREETING.to_string(),
            Err(e) => {
                tracing::warn!("patient greeting degraded to fallback: {e}");
                FALLBACK_GREETING.to_string()
            }
        }
    }

    /// Next in-character reply. System-role history entries never reach
    /// the completion; the caller appends the returned message itself.
    pub async fn respond(
        &self,
        case: &ClinicalCase,
        context: &PatientContext,
        history: &[ChatMessage],
        user_message: &str,
    ) -> Result<ChatMessage> {
        let mut messages: Vec<LlmMessage> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| match m.role {
                ChatRole::User => LlmMessage::user(m.content.clone()),
                _ => LlmMessage::assistant(m.content.clone()),
            })
            .collect();
        messages.push(LlmMessage::user(user_message));

        let request = LlmRequest {
            model: self.model.clone(),
            system: Some(prompts::patient_system(case, context)),
            messages,
            max_tokens: RESPONSE_MAX_TOKENS,
            temperature: Some(RESPONSE_TEMPERATURE),
            json_mode: false,
        };

        match self.provider.chat(request).await {
            Ok(response) => Ok(ChatMessage::assistant(response.text)),
            Err(e) => {
                tracing::error!("patient response generation failed: {e}");
                Err(anyhow!("failed to generate patient response"))
            }
        }
    }
}
