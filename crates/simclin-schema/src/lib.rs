pub mod case;
pub mod chat;
pub mod decision;
pub mod feedback;
pub mod simulation;

pub use case::{CaseOptions, ClinicalCase, ExamEntry, History, Patient, PhysicalExam, Vitals};
pub use chat::{ChatMessage, ChatRole};
pub use decision::{DecisionAction, DecisionResult, ExamRequest};
pub use feedback::{Comments, DiagnosisEval, FeedbackResult, ManagementEval, Scores};
pub use simulation::{
    PatientContext, RequestedExam, Simulation, SimulationStatus, REDACTION_SENTINEL,
};
