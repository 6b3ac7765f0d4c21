pub mod engine;
pub mod error;
pub mod store;

pub use engine::{CreatedSimulation, ProcessOutcome, SimulationEngine};
pub use error::EngineError;
pub use store::{InMemoryStore, SimulationStore};
