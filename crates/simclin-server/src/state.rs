use std::sync::Arc;

use simclin_agents::{ExamAgent, PatientAgent};
use simclin_engine::SimulationEngine;

use crate::archive::CaseArchive;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SimulationEngine>,
    /// Direct patient agent for the legacy /api/chat path.
    pub patient: Arc<PatientAgent>,
    /// Direct exam agent for standalone /api/generar-examen requests.
    pub exam: Arc<ExamAgent>,
    /// Client for the hosted case archive.
    pub archive: Arc<dyn CaseArchive>,
    /// Bearer token required by /api/update-anamnesis.
    pub anamnesis_token: Arc<String>,
}
