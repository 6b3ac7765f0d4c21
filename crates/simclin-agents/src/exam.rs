//! Exam request handling: pure normalization plus a resolver lookup.
//! No model call.

use std::sync::Arc;

use serde::Serialize;
use simclin_exams::ExamImageResolver;
use simclin_schema::{ClinicalCase, ExamRequest};

/// Public URL prefix under which resolved exam assets are served.
const ASSET_PREFIX: &str = "/examenes";

#[derive(Debug, Clone, Serialize)]
pub struct ExamOutcome {
    pub success: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub tipo: String,
    pub clasificacion: Option<String>,
    pub subclasificacion: Option<String>,
}

pub struct ExamAgent {
    resolver: Arc<ExamImageResolver>,
}

impl ExamAgent {
    pub fn new(resolver: Arc<ExamImageResolver>) -> Self {
        Self { resolver }
    }

    /// Normalize the request and look up the best-matching image. Never
    /// fails: an unmatched request comes back `success` with no image.
    pub fn process(&self, request: &ExamRequest, case: Option<&ClinicalCase>) -> ExamOutcome {
        self.process_with_diagnosis(request, case.map(|c| c.diagnostico_principal.as_str()))
    }

    /// Same lookup with a bare diagnosis string, for callers outside a
    /// stored simulation.
    pub fn process_with_diagnosis(
        &self,
        request: &ExamRequest,
        diagnostico: Option<&str>,
    ) -> ExamOutcome {
        let normalized = request.normalized();
        let image = self.resolver.find_exam_image(
            &normalized.tipo,
            normalized.clasificacion.as_deref().unwrap_or(""),
            normalized.subclasificacion.as_deref().unwrap_or(""),
            diagnostico,
        );

        ExamOutcome {
            success: true,
            image_url: image.map(|rel| format!("{ASSET_PREFIX}/{rel}")),
            tipo: normalized.tipo,
            clasificacion: normalized.clasificacion,
            subclasificacion: normalized.subclasificacion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver_with(paths: &[&str]) -> (TempDir, Arc<ExamImageResolver>) {
        let dir = TempDir::new().unwrap();
        for path in paths {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, b"img").unwrap();
        }
        let resolver = Arc::new(ExamImageResolver::new(dir.path()));
        (dir, resolver)
    }

    #[test]
    fn normalizes_and_resolves() {
        let (_dir, resolver) = resolver_with(&["radiografia/torax/normal/rx.png"]);
        let agent = ExamAgent::new(resolver);
        let outcome = agent.process(
            &ExamRequest {
                tipo: " RADIOGRAFIA ".into(),
                clasificacion: Some("Torax".into()),
                subclasificacion: None,
            },
            None,
        );
        assert!(outcome.success);
        assert_eq!(outcome.tipo, "radiografia");
        assert_eq!(
            outcome.image_url.as_deref(),
            Some("/examenes/radiografia/torax/normal/rx.png")
        );
    }

    #[test]
    fn unmatched_request_echoes_normalized_fields_without_image() {
        let (_dir, resolver) = resolver_with(&["radiografia/torax/normal/rx.png"]);
        let agent = ExamAgent::new(resolver);
        let outcome = agent.process(
            &ExamRequest {
                tipo: "Laboratorio".into(),
                clasificacion: Some("Hemograma".into()),
                subclasificacion: None,
            },
            None,
        );
        assert!(outcome.success);
        assert_eq!(outcome.image_url, None);
        assert_eq!(outcome.tipo, "laboratorio");
        assert_eq!(outcome.clasificacion.as_deref(), Some("hemograma"));
    }

    #[test]
    fn case_diagnosis_drives_inference() {
        let (_dir, resolver) = resolver_with(&[
            "radiografia/torax/neumonia/rx.png",
            "radiografia/torax/normal/rx.png",
        ]);
        let agent = ExamAgent::new(resolver);
        let mut case: ClinicalCase = serde_json::from_str(
            r#"{"especialidad":"urgencia","nivel_dificultad":"medio",
                "paciente":{"nombre":"X","edad":1,"sexo":"m"},
                "motivo_consulta":"tos","diagnostico_principal":"neumonía basal"}"#,
        )
        .unwrap();
        case.id = "c1".into();
        let outcome = agent.process(
            &ExamRequest {
                tipo: "radiografia".into(),
                clasificacion: Some("torax".into()),
                subclasificacion: None,
            },
            Some(&case),
        );
        assert_eq!(
            outcome.image_url.as_deref(),
            Some("/examenes/radiografia/torax/neumonia/rx.png")
        );
    }
}
