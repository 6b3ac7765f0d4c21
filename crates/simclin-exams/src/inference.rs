//! Subclassification inference from a free-text diagnosis.
//!
//! Fixed table of `{tipo: [(pattern, subclasificacion)]}`. Patterns are
//! matched case-insensitively as regexes; a pattern that fails to compile
//! falls back to plain substring matching.

use regex::RegexBuilder;

/// Keyword patterns per exam type, in priority order.
fn table_for(tipo: &str) -> &'static [(&'static str, &'static str)] {
    match tipo {
        "radiografia" | "rx" => &[
            (r"neumon[ií]a|condensaci[oó]n", "neumonia"),
            (r"derrame\s+pleural", "derrame"),
            (r"neumot[oó]rax", "neumotorax"),
            (r"fractura", "fractura"),
            (r"insuficiencia\s+card[ií]aca|congesti[oó]n", "congestion"),
        ],
        "ecg" | "electrocardiograma" => &[
            (r"infarto|iam|s[ií]ndrome\s+coronario", "infarto"),
            (r"fibrilaci[oó]n\s+auricular", "fibrilacion_auricular"),
            (r"bradicardia", "bradicardia"),
            (r"taquicardia", "taquicardia"),
        ],
        "ecografia" | "eco" => &[
            (r"colecistitis|c[aá]lculo|litiasis", "litiasis"),
            (r"apendicitis", "apendicitis"),
            (r"embarazo", "obstetrica"),
        ],
        "tac" | "tomografia" => &[
            (r"acv|accidente\s+cerebrovascular|ictus", "acv"),
            (r"hemorragia", "hemorragia"),
            (r"tumor|masa", "masa"),
        ],
        _ => &[],
    }
}

/// Infer a subclassification for `tipo` from the case's principal
/// diagnosis. Returns `None` when nothing in the table matches.
pub fn infer_subclasificacion(tipo: &str, diagnostico: &str) -> Option<String> {
    for (pattern, subclasificacion) in table_for(tipo) {
        let matched = match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => re.is_match(diagnostico),
            Err(_) => diagnostico.to_lowercase().contains(&pattern.to_lowercase()),
        };
        if matched {
            return Some((*subclasificacion).to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pneumonia_diagnosis_maps_to_neumonia() {
        assert_eq!(
            infer_subclasificacion("radiografia", "Neumonía adquirida en la comunidad"),
            Some("neumonia".into())
        );
    }

    #[test]
    fn accent_variants_match() {
        assert_eq!(
            infer_subclasificacion("radiografia", "neumonia basal derecha"),
            Some("neumonia".into())
        );
        assert_eq!(
            infer_subclasificacion("ecg", "Fibrilación auricular con respuesta rápida"),
            Some("fibrilacion_auricular".into())
        );
    }

    #[test]
    fn first_matching_pattern_wins() {
        // "infarto" appears before "taquicardia" in the ecg table
        assert_eq!(
            infer_subclasificacion("ecg", "infarto con taquicardia sinusal"),
            Some("infarto".into())
        );
    }

    #[test]
    fn unknown_tipo_or_diagnosis_yields_none() {
        assert_eq!(infer_subclasificacion("laboratorio", "neumonía"), None);
        assert_eq!(infer_subclasificacion("ecg", "apendicitis aguda"), None);
    }
}
