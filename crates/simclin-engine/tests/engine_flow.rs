//! End-to-end engine scenarios against scripted providers: no network,
//! no live model.

use std::fs;
use std::sync::Arc;

use simclin_agents::{
    CaseGenerator, DecisionAgent, ExamAgent, FeedbackAgent, PatientAgent,
};
use simclin_engine::{EngineError, InMemoryStore, SimulationEngine};
use simclin_exams::ExamImageResolver;
use simclin_provider::ScriptedProvider;
use simclin_schema::{
    CaseOptions, ChatRole, DecisionAction, SimulationStatus, REDACTION_SENTINEL,
};
use tempfile::TempDir;

const CASE_JSON: &str = r#"{
    "id": "caso_sim_1",
    "especialidad": "urgencia",
    "nivel_dificultad": "medio",
    "paciente": {"nombre": "Jorge Lagos", "edad": 52, "sexo": "masculino"},
    "motivo_consulta": "tos con fiebre de tres días",
    "sintomas": ["tos productiva", "fiebre", "dolor torácico al respirar"],
    "examen_fisico": {"signos_vitales": {"frecuencia_cardiaca": 104, "temperatura": 38.6}},
    "diagnostico_principal": "neumonía adquirida en la comunidad",
    "diagnosticos_diferenciales": ["bronquitis aguda"],
    "info_prohibida": ["radiografía con condensación basal derecha"]
}"#;

const FEEDBACK_JSON: &str = r#"{
    "puntajes": {"anamnesis": 5, "examen_fisico": 4, "razonamiento_diagnostico": 6,
                 "comunicacion": 6, "conocimiento_clinico": 5},
    "comentarios": {"fortalezas": ["preguntas dirigidas"], "debilidades": [], "sugerencias": []},
    "diagnostico": {"estudiante": "neumonía", "correcto": true,
                    "diagnostico_real": "neumonía adquirida en la comunidad",
                    "comentario": "bien fundamentado"}
}"#;

struct EngineBuilder {
    case_replies: Vec<Result<String, String>>,
    patient_replies: Vec<Result<String, String>>,
    decision_replies: Vec<Result<String, String>>,
    feedback_replies: Vec<Result<String, String>>,
    assets: Vec<&'static str>,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            case_replies: vec![Ok(CASE_JSON.into())],
            patient_replies: vec![Ok("Hola doctor, vengo por una tos fea.".into())],
            decision_replies: vec![],
            feedback_replies: vec![],
            assets: vec![],
        }
    }

    fn decisions(mut self, replies: &[&str]) -> Self {
        self.decision_replies = replies.iter().map(|r| Ok((*r).to_string())).collect();
        self
    }

    fn patient_turns(mut self, replies: &[&str]) -> Self {
        // first entry is always the greeting
        for r in replies {
            self.patient_replies.push(Ok((*r).to_string()));
        }
        self
    }

    fn feedbacks(mut self, replies: &[&str]) -> Self {
        self.feedback_replies = replies.iter().map(|r| Ok((*r).to_string())).collect();
        self
    }

    fn assets(mut self, paths: &[&'static str]) -> Self {
        self.assets = paths.to_vec();
        self
    }

    fn build(self) -> (TempDir, SimulationEngine) {
        let dir = TempDir::new().unwrap();
        for path in &self.assets {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, b"img").unwrap();
        }
        let resolver = Arc::new(ExamImageResolver::new(dir.path()));
        let engine = SimulationEngine::new(
            Arc::new(InMemoryStore::new()),
            CaseGenerator::new(
                Arc::new(ScriptedProvider::new(self.case_replies)),
                "gpt-4o",
            ),
            PatientAgent::new(
                Arc::new(ScriptedProvider::new(self.patient_replies)),
                "gpt-4o-mini",
            ),
            DecisionAgent::new(
                Arc::new(ScriptedProvider::new(self.decision_replies)),
                "gpt-4o-mini",
            ),
            ExamAgent::new(resolver),
            FeedbackAgent::new(
                Arc::new(ScriptedProvider::new(self.feedback_replies)),
                "gpt-4o",
            ),
        );
        (dir, engine)
    }
}

fn options() -> CaseOptions {
    CaseOptions {
        especialidad: "urgencia".into(),
        nivel_dificultad: "medio".into(),
        aps_subcategoria: None,
    }
}

#[tokio::test]
async fn create_simulation_stores_active_record_with_greeting() {
    let (_dir, engine) = EngineBuilder::new().build();
    let created = engine.create_simulation(&options()).await.unwrap();
    assert_eq!(created.simulation.id, "caso_sim_1");
    assert_eq!(created.simulation.status, SimulationStatus::Active);
    assert_eq!(created.simulation.chat_history.len(), 1);
    assert_eq!(
        created.simulation.chat_history[0].role,
        ChatRole::Assistant
    );
    assert_eq!(created.initial_message, "Hola doctor, vengo por una tos fea.");
}

#[tokio::test]
async fn process_message_unknown_id_is_not_found() {
    let (_dir, engine) = EngineBuilder::new().build();
    let err = engine.process_message("nope", "hola").await.unwrap_err();
    assert!(matches!(err, EngineError::SimulationNotFound(_)));
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn question_mark_message_always_stays_in_conversation() {
    // the classifier is scripted to insist on submit_diagnosis; the
    // deterministic override must keep the conversation going
    let (_dir, engine) = EngineBuilder::new()
        .decisions(&[r#"{"action":"submit_diagnosis","reasoning":"x"}"#])
        .patient_turns(&["Desde hace tres días, doctor."])
        .build();
    engine.create_simulation(&options()).await.unwrap();

    let outcome = engine
        .process_message("caso_sim_1", "¿Desde cuándo tiene el dolor?")
        .await
        .unwrap();
    assert_eq!(outcome.action, DecisionAction::PatientInteraction);
    assert_eq!(
        outcome.response.as_deref(),
        Some("Desde hace tres días, doctor.")
    );

    // greeting + user + patient reply
    let sim = engine.get_simulation("caso_sim_1", true).await.unwrap();
    assert_eq!(sim.chat_history.len(), 3);
    assert_eq!(sim.chat_history[1].role, ChatRole::User);
    assert_eq!(sim.chat_history[2].role, ChatRole::Assistant);
    assert_eq!(sim.status, SimulationStatus::Active);
}

#[tokio::test]
async fn diagnosis_submission_completes_and_returns_feedback() {
    let (_dir, engine) = EngineBuilder::new()
        .decisions(&[
            r#"{"action":"submit_diagnosis","reasoning":"diagnóstico declarado","extracted_diagnosis":"neumonía"}"#,
        ])
        .feedbacks(&[FEEDBACK_JSON])
        .build();
    engine.create_simulation(&options()).await.unwrap();

    let outcome = engine
        .process_message("caso_sim_1", "Mi diagnóstico es neumonía")
        .await
        .unwrap();
    assert_eq!(outcome.action, DecisionAction::SubmitDiagnosis);
    let feedback = outcome.feedback.unwrap();
    assert_eq!(feedback.puntajes.anamnesis, 5.0);
    assert_eq!(feedback.puntajes.comunicacion, 6.0);
    assert!(feedback.diagnostico.correcto);

    let sim = engine.get_simulation("caso_sim_1", true).await.unwrap();
    assert_eq!(sim.status, SimulationStatus::Completed);
    assert!(sim.feedback.is_some());
}

#[tokio::test]
async fn completed_simulation_rejects_further_messages() {
    let (_dir, engine) = EngineBuilder::new()
        .decisions(&[
            r#"{"action":"submit_diagnosis","reasoning":"x","extracted_diagnosis":"neumonía"}"#,
        ])
        .feedbacks(&[FEEDBACK_JSON])
        .build();
    engine.create_simulation(&options()).await.unwrap();
    engine
        .process_message("caso_sim_1", "Mi diagnóstico es neumonía")
        .await
        .unwrap();

    let err = engine
        .process_message("caso_sim_1", "otra pregunta")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::SimulationNotActive(_)));
    assert!(err.to_string().contains("not active"));

    // terminal state untouched by the rejected call
    let sim = engine.get_simulation("caso_sim_1", true).await.unwrap();
    assert_eq!(sim.status, SimulationStatus::Completed);
}

#[tokio::test]
async fn end_simulation_abandons() {
    let (_dir, engine) = EngineBuilder::new()
        .decisions(&[r#"{"action":"end_simulation","reasoning":"se despide"}"#])
        .build();
    engine.create_simulation(&options()).await.unwrap();

    let outcome = engine
        .process_message("caso_sim_1", "quiero terminar la simulación")
        .await
        .unwrap();
    assert_eq!(outcome.action, DecisionAction::EndSimulation);
    let sim = engine.get_simulation("caso_sim_1", true).await.unwrap();
    assert_eq!(sim.status, SimulationStatus::Abandoned);
}

#[tokio::test]
async fn exam_request_is_dispatched_and_accumulated() {
    let (_dir, engine) = EngineBuilder::new()
        .decisions(&[
            r#"{"action":"request_exam","reasoning":"pide imagen","exam_request":{"tipo":"Radiografia","clasificacion":"Torax"}}"#,
        ])
        .assets(&["radiografia/torax/neumonia/rx.png"])
        .build();
    engine.create_simulation(&options()).await.unwrap();

    let outcome = engine
        .process_message("caso_sim_1", "Solicito una radiografía de tórax")
        .await
        .unwrap();
    assert_eq!(outcome.action, DecisionAction::RequestExam);
    assert_eq!(outcome.requested_exams.len(), 1);
    let exam = &outcome.requested_exams[0];
    assert_eq!(exam.tipo, "radiografia");
    // subclasificacion inferred from the hidden diagnosis
    assert_eq!(
        exam.image_url.as_deref(),
        Some("/examenes/radiografia/torax/neumonia/rx.png")
    );
    assert!(outcome.response.unwrap().contains("/examenes/"));

    let sim = engine.get_simulation("caso_sim_1", true).await.unwrap();
    assert_eq!(sim.requested_exams.len(), 1);
    assert_eq!(sim.status, SimulationStatus::Active);
}

#[tokio::test]
async fn redacted_fetch_never_leaks_diagnosis() {
    let (_dir, engine) = EngineBuilder::new().build();
    engine.create_simulation(&options()).await.unwrap();

    let sim = engine.get_simulation("caso_sim_1", false).await.unwrap();
    assert_eq!(sim.case.diagnostico_principal, REDACTION_SENTINEL);
    assert!(sim.case.diagnosticos_diferenciales.is_empty());

    let full = engine.get_simulation("caso_sim_1", true).await.unwrap();
    assert_eq!(
        full.case.diagnostico_principal,
        "neumonía adquirida en la comunidad"
    );
}

#[tokio::test]
async fn lifecycle_helpers_report_success() {
    let (_dir, engine) = EngineBuilder::new().build();
    engine.create_simulation(&options()).await.unwrap();

    assert!(engine.complete_simulation("caso_sim_1").await);
    // already terminal: transitions are one-way
    assert!(!engine.abandon_simulation("caso_sim_1").await);
    assert!(engine.delete_simulation("caso_sim_1").await);
    assert!(!engine.delete_simulation("caso_sim_1").await);
    assert!(!engine.complete_simulation("caso_sim_1").await);
}

#[tokio::test]
async fn deferred_feedback_uses_management_plan() {
    let (_dir, engine) = EngineBuilder::new()
        .decisions(&[
            r#"{"action":"submit_diagnosis","reasoning":"x","extracted_diagnosis":"neumonía"}"#,
        ])
        .feedbacks(&[FEEDBACK_JSON, FEEDBACK_JSON])
        .build();
    engine.create_simulation(&options()).await.unwrap();
    engine
        .process_message("caso_sim_1", "Mi diagnóstico es neumonía")
        .await
        .unwrap();

    let plan = simclin_agents::ManagementPlan {
        derivacion: Some("hospitalización".into()),
        ..Default::default()
    };
    let feedback = engine
        .generate_feedback("caso_sim_1", Some(&plan))
        .await
        .unwrap();
    assert_eq!(feedback.puntajes.anamnesis, 5.0);

    let err = engine.generate_feedback("desconocido", None).await.unwrap_err();
    assert!(err.to_string().contains("not found"));
}
