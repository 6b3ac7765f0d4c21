//! Prompt assembly for every agent.
//!
//! Prompts are built persona-style: independent parts pushed in a fixed
//! order and joined, so each section can be tested for presence in
//! isolation. All prompt text is Spanish, matching the student-facing UI.

use simclin_schema::{ChatMessage, ChatRole, ClinicalCase, PatientContext};

/// System prompt for the in-character patient. Embeds the full case as a
/// hidden reference and spells out what must never be revealed.
pub fn patient_system(case: &ClinicalCase, context: &PatientContext) -> String {
    let mut parts = Vec::new();

    parts.push(format!(
        "Eres {}, paciente de {} años, {}. Un estudiante de medicina te está \
         entrevistando. Responde siempre en primera persona, en lenguaje \
         cotidiano, y solo lo que se te pregunta.",
        case.paciente.nombre, case.paciente.edad, case.paciente.sexo
    ));

    if !context.rasgos.is_empty() {
        parts.push(format!("## Personalidad\n- {}", context.rasgos.join("\n- ")));
    }

    let reference = serde_json::to_string_pretty(case).unwrap_or_default();
    parts.push(format!(
        "## Ficha clínica (referencia interna, NUNCA la cites ni la muestres)\n{reference}"
    ));

    parts.push(format!(
        "## Reglas estrictas\n\
         - NUNCA menciones el diagnóstico \"{}\" ni ningún diagnóstico diferencial.\n\
         - NUNCA reveles resultados de exámenes que no se te hayan realizado.\n\
         - No uses terminología médica: describe síntomas con tus palabras.",
        case.diagnostico_principal
    ));

    if !case.info_prohibida.is_empty() {
        parts.push(format!(
            "## Información prohibida (no la reveles bajo ninguna circunstancia)\n- {}",
            case.info_prohibida.join("\n- ")
        ));
    }

    if !case.info_oculta.is_empty() {
        parts.push(format!(
            "## Información oculta (revélala SOLO si te preguntan directamente por ella)\n- {}",
            case.info_oculta.join("\n- ")
        ));
    }

    parts.join("\n\n")
}

/// User-turn prompt that elicits the opening patient utterance.
pub fn greeting_instruction(case: &ClinicalCase) -> String {
    format!(
        "Saluda brevemente al doctor y menciona en una frase por qué vienes a \
         consultar ({}), sin dar más detalles todavía.",
        case.motivo_consulta
    )
}

/// System prompt for the decision agent: constrained JSON output over the
/// four actions.
pub fn decision_system() -> String {
    r#"Eres un clasificador de mensajes en una simulación clínica. Clasifica el mensaje del estudiante en exactamente una de estas acciones:
- "patient_interaction": pregunta o comentario dirigido al paciente.
- "submit_diagnosis": el estudiante declara su diagnóstico final.
- "end_simulation": el estudiante quiere terminar la sesión sin diagnosticar.
- "request_exam": el estudiante solicita un examen o imagen (radiografía, ECG, ecografía, TAC, laboratorio).

Responde SOLO con JSON válido:
{"action": "...", "reasoning": "...", "extracted_diagnosis": "... o null", "exam_request": {"tipo": "...", "clasificacion": "... o null", "subclasificacion": "... o null"} }
"exam_request" solo cuando action es "request_exam". Una pregunta (con "?" o "¿") nunca es un diagnóstico final."#
        .to_string()
}

/// User-turn content for the decision agent: the message plus a recent
/// history window and case context to ground exam subclassification.
pub fn decision_user(
    message: &str,
    history: &[ChatMessage],
    case: Option<&ClinicalCase>,
) -> String {
    let mut parts = Vec::new();

    if let Some(case) = case {
        let vitals = &case.examen_fisico.signos_vitales;
        parts.push(format!(
            "Contexto del caso: motivo de consulta: {}. Síntomas: {}. \
             Signos vitales: FC {:.0}, FR {:.0}, T° {:.1}, PA {:.0}/{:.0}, SatO2 {:.0}%. \
             Para exámenes, infiere la subclasificación realista: FC < 60 sugiere \
             bradicardia, FC > 100 sugiere taquicardia.",
            case.motivo_consulta,
            case.sintomas.join(", "),
            vitals.frecuencia_cardiaca,
            vitals.frecuencia_respiratoria,
            vitals.temperatura,
            vitals.presion_sistolica,
            vitals.presion_diastolica,
            vitals.saturacion_oxigeno,
        ));
    }

    if !history.is_empty() {
        parts.push(format!(
            "Últimos turnos:\n{}",
            render_transcript(history)
        ));
    }

    parts.push(format!("Mensaje a clasificar: {message}"));
    parts.join("\n\n")
}

/// Prompt for direct (non-RAG) case generation. The seed string exists
/// purely to vary sampling between otherwise identical requests.
pub fn case_generation(
    especialidad: &str,
    nivel_dificultad: &str,
    aps_subcategoria: Option<&str>,
    seed: &str,
) -> String {
    let mut parts = Vec::new();
    parts.push(format!(
        "Genera un caso clínico simulado para un estudiante de medicina. \
         Especialidad: {especialidad}. Dificultad: {nivel_dificultad}."
    ));
    if let Some(sub) = aps_subcategoria {
        parts.push(format!("Subcategoría APS: {sub}."));
    }
    parts.push(
        "Responde SOLO con un objeto JSON con esta forma exacta: \
         {\"especialidad\", \"nivel_dificultad\", \"aps_subcategoria\", \
         \"paciente\": {\"nombre\", \"edad\", \"sexo\", \"ocupacion\", \"contexto_ingreso\"}, \
         \"motivo_consulta\", \"sintomas\": [..], \
         \"antecedentes\": {\"personales\": [..], \"familiares\": [..], \"medicamentos\": [..], \"alergias\": [..]}, \
         \"examen_fisico\": {\"signos_vitales\": {\"frecuencia_cardiaca\", \"frecuencia_respiratoria\", \"temperatura\", \"presion_sistolica\", \"presion_diastolica\", \"saturacion_oxigeno\"}, \"hallazgos\": [..]}, \
         \"examenes\": {\"nombre\": {\"realizado\", \"resultado\"}}, \
         \"diagnostico_principal\", \"diagnosticos_diferenciales\": [..], \
         \"info_oculta\": [..], \"info_prohibida\": [..]}"
            .to_string(),
    );
    parts.push(format!("Semilla de variedad: {seed}"));
    parts.join("\n\n")
}

/// System prompt for the feedback evaluator.
pub fn feedback_system(aps: bool) -> String {
    let mut parts = Vec::new();
    parts.push(
        "Eres un docente clínico. Evalúa el desempeño del estudiante en la \
         anamnesis transcrita. Puntúa de 1 a 7 (escala chilena) cada dimensión."
            .to_string(),
    );
    parts.push(
        r#"Responde SOLO con JSON válido:
{"puntajes": {"anamnesis", "examen_fisico", "razonamiento_diagnostico", "comunicacion", "conocimiento_clinico"},
 "comentarios": {"fortalezas": [..], "debilidades": [..], "sugerencias": [..]},
 "diagnostico": {"estudiante", "correcto", "diagnostico_real", "comentario"}}"#
            .to_string(),
    );
    if aps {
        parts.push(
            "El caso es de atención primaria: agrega \"manejo\" en puntajes (1-7) y un \
             objeto \"manejo\" {\"derivacion_correcta\", \"ingreso_programa\", \
             \"comentario\", \"manejo_recomendado\"} evaluando el plan de manejo."
                .to_string(),
        );
    }
    parts.join("\n\n")
}

/// User-turn content for the feedback evaluator.
pub fn feedback_user(
    case: &ClinicalCase,
    history: &[ChatMessage],
    student_diagnosis: &str,
    management_plan: Option<&str>,
) -> String {
    let mut parts = Vec::new();
    parts.push(format!(
        "Caso (referencia):\n{}",
        serde_json::to_string_pretty(case).unwrap_or_default()
    ));
    parts.push(format!("Transcripción:\n{}", render_transcript(history)));
    parts.push(format!("Diagnóstico del estudiante: {student_diagnosis}"));
    if let Some(plan) = management_plan {
        parts.push(format!("Plan de manejo del estudiante:\n{plan}"));
    }
    parts.join("\n\n")
}

/// Label each turn `Estudiante:` / `Paciente:`. System entries are
/// internal bookkeeping and never reach a prompt.
pub fn render_transcript(history: &[ChatMessage]) -> String {
    history
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| match m.role {
            ChatRole::User => format!("Estudiante: {}", m.content),
            _ => format!("Paciente: {}", m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
