//! The simulation orchestrator: owns the store, routes each incoming
//! message through the decision agent and dispatches to the patient,
//! exam or feedback agents.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use simclin_agents::{
    CaseGenerator, DecisionAgent, ExamAgent, FeedbackAgent, ManagementPlan, PatientAgent,
    APS_SUBCATEGORIES,
};
use simclin_schema::{
    CaseOptions, ChatMessage, DecisionAction, DecisionResult, FeedbackResult, RequestedExam,
    Simulation, SimulationStatus,
};
use tokio::sync::Mutex;

use crate::error::EngineError;
use crate::store::SimulationStore;

const DIAGNOSIS_ACK: &str =
    "Gracias, doctor. La simulación ha finalizado; revise su retroalimentación.";
const CLOSING_MESSAGE: &str = "La simulación ha sido finalizada. ¡Hasta la próxima!";
const EXAM_UNAVAILABLE: &str = "no hay imagen disponible para ese examen";

pub struct SimulationEngine {
    store: Arc<dyn SimulationStore>,
    /// Per-simulation write locks: one message in flight per id.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    case_generator: CaseGenerator,
    patient: PatientAgent,
    decision: DecisionAgent,
    exam: ExamAgent,
    feedback: FeedbackAgent,
}

/// Result of creating a simulation: the stored record plus the patient's
/// opening message (already appended to its history).
pub struct CreatedSimulation {
    pub simulation: Simulation,
    pub initial_message: String,
}

/// What one `process_message` call did.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub action: DecisionAction,
    pub reasoning: String,
    pub response: Option<String>,
    pub feedback: Option<FeedbackResult>,
    pub requested_exams: Vec<RequestedExam>,
    pub timestamp: DateTime<Utc>,
}

impl SimulationEngine {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        case_generator: CaseGenerator,
        patient: PatientAgent,
        decision: DecisionAgent,
        exam: ExamAgent,
        feedback: FeedbackAgent,
    ) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            case_generator,
            patient,
            decision,
            exam,
            feedback,
        }
    }

    /// Generate a case, wrap it in an active simulation with the
    /// patient's greeting as the first message, and store it.
    pub async fn create_simulation(
        &self,
        options: &CaseOptions,
    ) -> Result<CreatedSimulation, EngineError> {
        let mut options = options.clone();
        let is_aps = options.especialidad.trim().eq_ignore_ascii_case("aps");
        if is_aps && options.aps_subcategoria.is_none() {
            let pick = APS_SUBCATEGORIES
                .choose(&mut rand::thread_rng())
                .map(|s| (*s).to_string());
            options.aps_subcategoria = pick;
        }

        let case = self.case_generator.generate(&options).await?;
        let mut simulation = Simulation::new(case);
        let greeting = self
            .patient
            .initial_greeting(&simulation.case, &simulation.patient_context)
            .await;
        simulation
            .chat_history
            .push(ChatMessage::assistant(greeting.clone()));
        self.store.insert(simulation.clone()).await;
        tracing::info!(id = %simulation.id, especialidad = %simulation.case.especialidad, "simulation created");

        Ok(CreatedSimulation {
            simulation,
            initial_message: greeting,
        })
    }

    /// Route one student message. The user turn is appended before the
    /// decision agent runs; any reply is appended after it completes.
    pub async fn process_message(
        &self,
        id: &str,
        message: &str,
    ) -> Result<ProcessOutcome, EngineError> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut simulation = self
            .store
            .get(id)
            .await
            .ok_or_else(|| EngineError::SimulationNotFound(id.to_string()))?;
        if simulation.status != SimulationStatus::Active {
            return Err(EngineError::SimulationNotActive(id.to_string()));
        }

        simulation.chat_history.push(ChatMessage::user(message));
        let prior_turns = simulation.chat_history.len() - 1;

        let decision = self
            .decision
            .classify(
                message,
                &simulation.chat_history[..prior_turns],
                Some(&simulation.case),
            )
            .await;

        let outcome = self
            .dispatch(&mut simulation, message, decision)
            .await?;

        simulation.touch();
        self.store.update(simulation).await;
        Ok(outcome)
    }

    async fn dispatch(
        &self,
        simulation: &mut Simulation,
        message: &str,
        decision: DecisionResult,
    ) -> Result<ProcessOutcome, EngineError> {
        let prior_turns = simulation.chat_history.len() - 1;
        let mut outcome = ProcessOutcome {
            action: decision.action,
            reasoning: decision.reasoning.clone(),
            response: None,
            feedback: None,
            requested_exams: Vec::new(),
            timestamp: Utc::now(),
        };

        match decision.action {
            DecisionAction::PatientInteraction => {
                let reply = self
                    .patient
                    .respond(
                        &simulation.case,
                        &simulation.patient_context,
                        &simulation.chat_history[..prior_turns],
                        message,
                    )
                    .await?;
                outcome.response = Some(reply.content.clone());
                simulation.chat_history.push(reply);
            }
            DecisionAction::SubmitDiagnosis => {
                let diagnosis = decision
                    .extracted_diagnosis
                    .as_deref()
                    .unwrap_or(message);
                // score the conversation as it stood before the
                // diagnosis message itself
                let feedback = self
                    .feedback
                    .generate(
                        &simulation.case,
                        &simulation.chat_history[..prior_turns],
                        diagnosis,
                        None,
                    )
                    .await?;
                simulation.feedback = Some(feedback.clone());
                simulation.status = SimulationStatus::Completed;
                simulation
                    .chat_history
                    .push(ChatMessage::assistant(DIAGNOSIS_ACK));
                outcome.response = Some(DIAGNOSIS_ACK.to_string());
                outcome.feedback = Some(feedback);
            }
            DecisionAction::EndSimulation => {
                simulation.status = SimulationStatus::Abandoned;
                simulation
                    .chat_history
                    .push(ChatMessage::assistant(CLOSING_MESSAGE));
                outcome.response = Some(CLOSING_MESSAGE.to_string());
            }
            DecisionAction::RequestExam => match decision.exam_request {
                Some(request) => {
                    let exam_outcome = self.exam.process(&request, Some(&simulation.case));
                    let ack = match &exam_outcome.image_url {
                        Some(url) => format!(
                            "Examen {} realizado. Imagen disponible en {url}.",
                            exam_outcome.tipo
                        ),
                        None => format!(
                            "Examen {} solicitado; {EXAM_UNAVAILABLE}.",
                            exam_outcome.tipo
                        ),
                    };
                    simulation.requested_exams.push(RequestedExam {
                        tipo: exam_outcome.tipo,
                        clasificacion: exam_outcome.clasificacion,
                        subclasificacion: exam_outcome.subclasificacion,
                        image_url: exam_outcome.image_url,
                        requested_at: Utc::now(),
                    });
                    simulation.chat_history.push(ChatMessage::assistant(&ack));
                    outcome.response = Some(ack);
                }
                None => {
                    // classifier said exam but gave no request; keep the
                    // conversation moving instead of stalling
                    tracing::warn!(id = %simulation.id, "request_exam without exam_request, treating as patient interaction");
                    let reply = self
                        .patient
                        .respond(
                            &simulation.case,
                            &simulation.patient_context,
                            &simulation.chat_history[..prior_turns],
                            message,
                        )
                        .await?;
                    outcome.action = DecisionAction::PatientInteraction;
                    outcome.response = Some(reply.content.clone());
                    simulation.chat_history.push(reply);
                }
            },
        }

        outcome.requested_exams = simulation.requested_exams.clone();
        Ok(outcome)
    }

    /// Fetch a simulation, redacting the diagnosis unless the caller is
    /// allowed to see it.
    pub async fn get_simulation(
        &self,
        id: &str,
        include_diagnosis: bool,
    ) -> Result<Simulation, EngineError> {
        let simulation = self
            .store
            .get(id)
            .await
            .ok_or_else(|| EngineError::SimulationNotFound(id.to_string()))?;
        Ok(if include_diagnosis {
            simulation
        } else {
            simulation.redacted()
        })
    }

    /// Re-score a simulation, optionally with a structured management
    /// plan attached (primary-care flow). Works on completed simulations.
    pub async fn generate_feedback(
        &self,
        id: &str,
        management_plan: Option<&ManagementPlan>,
    ) -> Result<FeedbackResult, EngineError> {
        let mut simulation = self
            .store
            .get(id)
            .await
            .ok_or_else(|| EngineError::SimulationNotFound(id.to_string()))?;

        let diagnosis = simulation
            .feedback
            .as_ref()
            .map(|f| f.diagnostico.estudiante.clone())
            .or_else(|| {
                simulation
                    .chat_history
                    .iter()
                    .rev()
                    .find(|m| m.role == simclin_schema::ChatRole::User)
                    .map(|m| m.content.clone())
            })
            .unwrap_or_else(|| "no declarado".to_string());

        let feedback = self
            .feedback
            .generate(
                &simulation.case,
                &simulation.chat_history,
                &diagnosis,
                management_plan,
            )
            .await?;
        simulation.feedback = Some(feedback.clone());
        simulation.touch();
        self.store.update(simulation).await;
        Ok(feedback)
    }

    pub async fn complete_simulation(&self, id: &str) -> bool {
        self.transition(id, SimulationStatus::Completed).await
    }

    pub async fn abandon_simulation(&self, id: &str) -> bool {
        self.transition(id, SimulationStatus::Abandoned).await
    }

    pub async fn delete_simulation(&self, id: &str) -> bool {
        self.locks.lock().await.remove(id);
        self.store.remove(id).await
    }

    /// Terminal states are one-way: only an active simulation moves.
    async fn transition(&self, id: &str, to: SimulationStatus) -> bool {
        match self.store.get(id).await {
            Some(mut simulation) if simulation.status == SimulationStatus::Active => {
                simulation.status = to;
                simulation.touch();
                self.store.update(simulation).await;
                true
            }
            _ => false,
        }
    }

    async fn lock_for(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
