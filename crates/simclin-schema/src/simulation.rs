use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::case::ClinicalCase;
use crate::chat::ChatMessage;
use crate::feedback::FeedbackResult;

/// Placeholder substituted for the true diagnosis in redacted copies.
pub const REDACTION_SENTINEL: &str = "[OCULTO]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    Active,
    Completed,
    Abandoned,
}

impl SimulationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Static patient persona traits attached to a simulation at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(default)]
    pub rasgos: Vec<String>,
}

impl PatientContext {
    /// Default personality handed to every simulated patient.
    pub fn standard() -> Self {
        Self {
            rasgos: vec![
                "colaborador pero ansioso".into(),
                "responde solo lo que se le pregunta".into(),
                "usa lenguaje cotidiano, no términos médicos".into(),
            ],
        }
    }
}

/// An exam the student requested during the encounter. The list on the
/// simulation is accumulate-only, in request order, never deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedExam {
    pub tipo: String,
    #[serde(default)]
    pub clasificacion: Option<String>,
    #[serde(default)]
    pub subclasificacion: Option<String>,
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "requestedAt")]
    pub requested_at: DateTime<Utc>,
}

/// Mutable aggregate owned by the engine. Not durable: a process restart
/// loses every simulation; the hosted archive is the system of record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub id: String,
    pub case: ClinicalCase,
    #[serde(default)]
    pub patient_context: PatientContext,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub requested_exams: Vec<RequestedExam>,
    pub status: SimulationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Simulation {
    pub fn new(case: ClinicalCase) -> Self {
        let now = Utc::now();
        Self {
            id: case.id.clone(),
            case,
            patient_context: PatientContext::standard(),
            chat_history: Vec::new(),
            requested_exams: Vec::new(),
            status: SimulationStatus::Active,
            feedback: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Copy safe to hand to a client that must not see the answer yet:
    /// the principal diagnosis is replaced by a sentinel and the
    /// differential list is cleared.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.case.diagnostico_principal = REDACTION_SENTINEL.to_string();
        copy.case.diagnosticos_diferenciales.clear();
        copy
    }
}
