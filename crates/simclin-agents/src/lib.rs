pub mod case_gen;
pub mod decision;
pub mod exam;
pub mod feedback;
pub mod patient;
pub mod prompts;
mod util;

use anyhow::Result;
use async_trait::async_trait;
use simclin_provider::AssistantClient;

pub use case_gen::{CaseGenerator, APS_SUBCATEGORIES};
pub use decision::DecisionAgent;
pub use exam::{ExamAgent, ExamOutcome};
pub use feedback::{FeedbackAgent, ManagementPlan};
pub use patient::PatientAgent;

/// Retrieval-augmented assistant used by the APS case path. Object-safe
/// so tests can script it; `simclin_provider::AssistantClient` is the
/// production implementation.
#[async_trait]
pub trait RagAssistant: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl RagAssistant for simclin_provider::AssistantClient {
    async fn ask(&self, prompt: &str) -> Result<String> {
        AssistantClient::ask(self, prompt).await
    }
}
