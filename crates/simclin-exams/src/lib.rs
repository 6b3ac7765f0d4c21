//! Exam image resolver.
//!
//! Scans a static asset tree laid out as `tipo/clasificacion/subclasificacion/...`
//! and scores candidate images against a requested exam. The scan result is
//! cached for the process lifetime; `clear_cache` exists for development.

pub mod inference;

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

pub use inference::infer_subclasificacion;

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "svg", "webp", "gif"];

/// Minimum score for a candidate to be returned: at least an exact or
/// partial type match.
const MIN_SCORE: u32 = 100;

pub struct ExamImageResolver {
    root: PathBuf,
    cache: RwLock<Option<Arc<Vec<String>>>>,
}

impl ExamImageResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(None),
        }
    }

    /// Find the best-matching image for an exam request. All inputs are
    /// expected lower-cased and trimmed; `subclasificacion` may be empty,
    /// in which case it is inferred from `diagnostico_principal` when one
    /// is supplied. Returns a path relative to the asset root.
    pub fn find_exam_image(
        &self,
        tipo: &str,
        clasificacion: &str,
        subclasificacion: &str,
        diagnostico_principal: Option<&str>,
    ) -> Option<String> {
        let images = self.scan();
        if images.is_empty() {
            return None;
        }

        let inferred;
        let subclasificacion = if subclasificacion.is_empty() {
            match diagnostico_principal.and_then(|d| infer_subclasificacion(tipo, d)) {
                Some(sub) => {
                    inferred = sub;
                    inferred.as_str()
                }
                None => "",
            }
        } else {
            subclasificacion
        };

        let mut scored: Vec<(u32, &String)> = images
            .iter()
            .map(|path| (score_path(path, tipo, clasificacion, subclasificacion), path))
            .filter(|(score, _)| *score >= MIN_SCORE)
            .collect();

        scored.sort_by(|(score_a, path_a), (score_b, path_b)| {
            score_b
                .cmp(score_a)
                .then_with(|| has_normal_segment(path_b).cmp(&has_normal_segment(path_a)))
                .then_with(|| path_a.cmp(path_b))
        });

        scored.first().map(|(_, path)| (*path).clone())
    }

    /// Drop the cached directory scan. Development aid.
    pub fn clear_cache(&self) {
        *self.cache.write().expect("exam cache poisoned") = None;
    }

    fn scan(&self) -> Arc<Vec<String>> {
        if let Some(cached) = self.cache.read().expect("exam cache poisoned").as_ref() {
            return cached.clone();
        }
        let mut images = Vec::new();
        if let Err(e) = collect_images(&self.root, &self.root, &mut images) {
            tracing::warn!("exam image scan failed under {}: {e}", self.root.display());
            images.clear();
        }
        images.sort();
        let images = Arc::new(images);
        *self.cache.write().expect("exam cache poisoned") = Some(images.clone());
        images
    }
}

fn collect_images(root: &Path, dir: &Path, out: &mut Vec<String>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_images(root, &path, out)?;
        } else if is_image(&path) {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Score a relative path against the requested exam. Path layout is
/// `[tipo, clasificacion, subclasificacion, ...]`; the file name itself
/// never scores.
fn score_path(path: &str, tipo: &str, clasificacion: &str, subclasificacion: &str) -> u32 {
    let segments: Vec<&str> = path.split('/').collect();
    // last segment is the file name
    let dirs = &segments[..segments.len().saturating_sub(1)];

    let mut score = 0;
    score += match_score(dirs.first(), tipo, 100, 50);
    score += match_score(dirs.get(1), clasificacion, 50, 25);
    score += match_score(dirs.get(2), subclasificacion, 30, 15);
    score
}

fn match_score(segment: Option<&&str>, query: &str, exact: u32, partial: u32) -> u32 {
    let Some(segment) = segment else { return 0 };
    if query.is_empty() {
        return 0;
    }
    let segment = segment.to_lowercase();
    if segment == query {
        exact
    } else if segment.contains(query) || query.contains(segment.as_str()) {
        partial
    } else {
        0
    }
}

fn has_normal_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment == "normal")
}
