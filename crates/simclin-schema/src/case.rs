use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Demographics of the simulated patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub nombre: String,
    pub edad: u32,
    pub sexo: String,
    #[serde(default)]
    pub ocupacion: String,
    /// How/why the patient arrived (ambulatory, ER, referral...).
    #[serde(default)]
    pub contexto_ingreso: String,
}

/// Structured clinical history lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub personales: Vec<String>,
    #[serde(default)]
    pub familiares: Vec<String>,
    #[serde(default)]
    pub medicamentos: Vec<String>,
    #[serde(default)]
    pub alergias: Vec<String>,
}

/// Vital signs as reported by the case generator.
///
/// Model output is not trusted: [`Vitals::clamp`] bounds every field to a
/// physiologically survivable range before the case is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(default)]
    pub frecuencia_cardiaca: f64,
    #[serde(default)]
    pub frecuencia_respiratoria: f64,
    #[serde(default)]
    pub temperatura: f64,
    #[serde(default)]
    pub presion_sistolica: f64,
    #[serde(default)]
    pub presion_diastolica: f64,
    #[serde(default)]
    pub saturacion_oxigeno: f64,
}

impl Vitals {
    /// Clamp every vital to plausible bounds, logging any field that had
    /// to be corrected. Zero means "not reported" and is left alone.
    pub fn clamp(&mut self) {
        fn bound(name: &str, value: &mut f64, lo: f64, hi: f64) {
            if *value == 0.0 {
                return;
            }
            let clamped = value.clamp(lo, hi);
            if clamped != *value {
                tracing::warn!(field = name, raw = *value, clamped, "clamped implausible vital");
                *value = clamped;
            }
        }
        bound("frecuencia_cardiaca", &mut self.frecuencia_cardiaca, 20.0, 250.0);
        bound("frecuencia_respiratoria", &mut self.frecuencia_respiratoria, 4.0, 80.0);
        bound("temperatura", &mut self.temperatura, 30.0, 43.0);
        bound("presion_sistolica", &mut self.presion_sistolica, 50.0, 260.0);
        bound("presion_diastolica", &mut self.presion_diastolica, 20.0, 160.0);
        bound("saturacion_oxigeno", &mut self.saturacion_oxigeno, 50.0, 100.0);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicalExam {
    #[serde(default)]
    pub signos_vitales: Vitals,
    #[serde(default)]
    pub hallazgos: Vec<String>,
}

/// One entry in the case's exam table: whether it was performed at
/// admission and, if so, the reported result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExamEntry {
    #[serde(default)]
    pub realizado: bool,
    #[serde(default)]
    pub resultado: Option<String>,
}

/// A generated clinical case. Immutable after creation; the engine only
/// ever produces redacted copies of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalCase {
    #[serde(default)]
    pub id: String,
    pub especialidad: String,
    pub nivel_dificultad: String,
    #[serde(default)]
    pub aps_subcategoria: Option<String>,
    pub paciente: Patient,
    pub motivo_consulta: String,
    #[serde(default)]
    pub sintomas: Vec<String>,
    #[serde(default)]
    pub antecedentes: History,
    #[serde(default)]
    pub examen_fisico: PhysicalExam,
    #[serde(default)]
    pub examenes: BTreeMap<String, ExamEntry>,
    pub diagnostico_principal: String,
    #[serde(default)]
    pub diagnosticos_diferenciales: Vec<String>,
    /// Facts the patient reveals only if asked directly.
    #[serde(default)]
    pub info_oculta: Vec<String>,
    /// Facts the patient must never reveal.
    #[serde(default)]
    pub info_prohibida: Vec<String>,
}

impl ClinicalCase {
    pub fn is_aps(&self) -> bool {
        self.especialidad.trim().eq_ignore_ascii_case("aps")
    }
}

/// Options for requesting a new case from the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseOptions {
    pub especialidad: String,
    pub nivel_dificultad: String,
    #[serde(default)]
    pub aps_subcategoria: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_case_json() -> &'static str {
        r#"{
            "especialidad": "urgencia",
            "nivel_dificultad": "medio",
            "paciente": {
                "nombre": "Rosa Fuentes",
                "edad": 64,
                "sexo": "femenino",
                "ocupacion": "profesora jubilada",
                "contexto_ingreso": "consulta en urgencias por dolor torácico"
            },
            "motivo_consulta": "dolor torácico opresivo de 2 horas",
            "sintomas": ["dolor retroesternal", "sudoración"],
            "examen_fisico": {
                "signos_vitales": {
                    "frecuencia_cardiaca": 110,
                    "frecuencia_respiratoria": 22,
                    "temperatura": 36.8,
                    "presion_sistolica": 150,
                    "presion_diastolica": 90,
                    "saturacion_oxigeno": 94
                },
                "hallazgos": ["paciente sudorosa, ansiosa"]
            },
            "diagnostico_principal": "infarto agudo de miocardio",
            "diagnosticos_diferenciales": ["angina inestable", "disección aórtica"],
            "info_oculta": ["fuma 10 cigarrillos al día"],
            "info_prohibida": ["el ECG muestra supradesnivel ST"]
        }"#
    }

    #[test]
    fn case_deserializes_with_defaults() {
        let case: ClinicalCase = serde_json::from_str(sample_case_json()).unwrap();
        assert_eq!(case.id, "");
        assert_eq!(case.especialidad, "urgencia");
        assert!(case.antecedentes.personales.is_empty());
        assert!(case.examenes.is_empty());
        assert_eq!(case.paciente.edad, 64);
        assert!(!case.is_aps());
    }

    #[test]
    fn case_serde_roundtrip() {
        let case: ClinicalCase = serde_json::from_str(sample_case_json()).unwrap();
        let json = serde_json::to_string(&case).unwrap();
        let back: ClinicalCase = serde_json::from_str(&json).unwrap();
        assert_eq!(back.diagnostico_principal, "infarto agudo de miocardio");
        assert_eq!(back.info_prohibida.len(), 1);
    }

    #[test]
    fn is_aps_ignores_case_and_whitespace() {
        let mut case: ClinicalCase = serde_json::from_str(sample_case_json()).unwrap();
        case.especialidad = " APS ".into();
        assert!(case.is_aps());
    }

    #[test]
    fn vitals_clamp_bounds_impossible_values() {
        let mut vitals = Vitals {
            frecuencia_cardiaca: 900.0,
            frecuencia_respiratoria: 22.0,
            temperatura: 12.0,
            presion_sistolica: 150.0,
            presion_diastolica: 90.0,
            saturacion_oxigeno: 140.0,
        };
        vitals.clamp();
        assert_eq!(vitals.frecuencia_cardiaca, 250.0);
        assert_eq!(vitals.temperatura, 30.0);
        assert_eq!(vitals.saturacion_oxigeno, 100.0);
        // untouched in-range value
        assert_eq!(vitals.frecuencia_respiratoria, 22.0);
    }

    #[test]
    fn vitals_clamp_skips_unreported_fields() {
        let mut vitals = Vitals::default();
        vitals.clamp();
        assert_eq!(vitals.frecuencia_cardiaca, 0.0);
    }
}
