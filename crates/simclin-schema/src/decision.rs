use serde::{Deserialize, Serialize};

/// Closed set of things a single student message can mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    PatientInteraction,
    SubmitDiagnosis,
    EndSimulation,
    RequestExam,
}

impl DecisionAction {
    /// Parse a raw model-emitted action string. Unknown strings yield
    /// `None` so the caller can apply its safe default.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "patient_interaction" => Some(Self::PatientInteraction),
            "submit_diagnosis" => Some(Self::SubmitDiagnosis),
            "end_simulation" => Some(Self::EndSimulation),
            "request_exam" => Some(Self::RequestExam),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PatientInteraction => "patient_interaction",
            Self::SubmitDiagnosis => "submit_diagnosis",
            Self::EndSimulation => "end_simulation",
            Self::RequestExam => "request_exam",
        }
    }
}

/// A structured exam request extracted from the student's message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamRequest {
    pub tipo: String,
    #[serde(default)]
    pub clasificacion: Option<String>,
    #[serde(default)]
    pub subclasificacion: Option<String>,
}

impl ExamRequest {
    /// Lower-cased, trimmed copy. Empty optional fields collapse to `None`.
    pub fn normalized(&self) -> Self {
        fn norm_opt(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
        }
        Self {
            tipo: self.tipo.trim().to_lowercase(),
            clasificacion: norm_opt(&self.clasificacion),
            subclasificacion: norm_opt(&self.subclasificacion),
        }
    }
}

/// Output of the decision agent for one message. Ephemeral: produced and
/// consumed within a single `process_message` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResult {
    pub action: DecisionAction,
    pub reasoning: String,
    #[serde(default)]
    pub extracted_diagnosis: Option<String>,
    #[serde(default)]
    pub exam_request: Option<ExamRequest>,
}

impl DecisionResult {
    pub fn patient_interaction(reasoning: impl Into<String>) -> Self {
        Self {
            action: DecisionAction::PatientInteraction,
            reasoning: reasoning.into(),
            extracted_diagnosis: None,
            exam_request: None,
        }
    }
}
