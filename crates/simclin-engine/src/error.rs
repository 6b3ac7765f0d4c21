use thiserror::Error;

/// Closed error set for engine operations. The HTTP layer maps variants
/// to status codes directly; the Display strings intentionally keep the
/// legacy "not found" / "not active" substrings older clients sniffed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("simulation not found: {0}")]
    SimulationNotFound(String),
    #[error("simulation not active: {0}")]
    SimulationNotActive(String),
    #[error(transparent)]
    Agent(#[from] anyhow::Error),
}
