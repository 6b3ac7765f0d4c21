use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 7.0;

fn default_score() -> f64 {
    MIN_SCORE
}

/// Named scores on the Chilean 1–7 scale. Fields missing from model
/// output deserialize to the minimum, never to an undefined value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default = "default_score")]
    pub anamnesis: f64,
    #[serde(default = "default_score")]
    pub examen_fisico: f64,
    #[serde(default = "default_score")]
    pub razonamiento_diagnostico: f64,
    #[serde(default = "default_score")]
    pub comunicacion: f64,
    #[serde(default = "default_score")]
    pub conocimiento_clinico: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manejo: Option<f64>,
}

impl Default for Scores {
    fn default() -> Self {
        Self {
            anamnesis: MIN_SCORE,
            examen_fisico: MIN_SCORE,
            razonamiento_diagnostico: MIN_SCORE,
            comunicacion: MIN_SCORE,
            conocimiento_clinico: MIN_SCORE,
            manejo: None,
        }
    }
}

impl Scores {
    /// Clamp every score into the 1–7 scale.
    pub fn clamp(&mut self) {
        for score in [
            &mut self.anamnesis,
            &mut self.examen_fisico,
            &mut self.razonamiento_diagnostico,
            &mut self.comunicacion,
            &mut self.conocimiento_clinico,
        ] {
            *score = score.clamp(MIN_SCORE, MAX_SCORE);
        }
        if let Some(manejo) = &mut self.manejo {
            *manejo = manejo.clamp(MIN_SCORE, MAX_SCORE);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comments {
    #[serde(default)]
    pub fortalezas: Vec<String>,
    #[serde(default)]
    pub debilidades: Vec<String>,
    #[serde(default)]
    pub sugerencias: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisEval {
    pub estudiante: String,
    pub correcto: bool,
    pub diagnostico_real: String,
    #[serde(default)]
    pub comentario: String,
}

/// Primary-care management evaluation, present only for APS cases where
/// the model actually scored the plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagementEval {
    #[serde(default)]
    pub derivacion_correcta: Option<bool>,
    #[serde(default)]
    pub ingreso_programa: Option<bool>,
    #[serde(default)]
    pub comentario: Option<String>,
    #[serde(default)]
    pub manejo_recomendado: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub puntajes: Scores,
    #[serde(default)]
    pub comentarios: Comments,
    pub diagnostico: DiagnosisEval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manejo: Option<ManagementEval>,
}
