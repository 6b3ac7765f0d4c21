//! Simulation storage behind a trait: the in-memory map is the default,
//! a durable backend can be slotted in without touching the engine.

use std::collections::HashMap;

use async_trait::async_trait;
use simclin_schema::Simulation;
use tokio::sync::RwLock;

#[async_trait]
pub trait SimulationStore: Send + Sync {
    async fn insert(&self, simulation: Simulation);
    async fn get(&self, id: &str) -> Option<Simulation>;
    async fn update(&self, simulation: Simulation);
    async fn remove(&self, id: &str) -> bool;
    async fn count(&self) -> usize;
}

/// Process-local, non-durable store. A restart loses everything; the
/// hosted archive is the system of record.
#[derive(Default)]
pub struct InMemoryStore {
    simulations: RwLock<HashMap<String, Simulation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SimulationStore for InMemoryStore {
    async fn insert(&self, simulation: Simulation) {
        self.simulations
            .write()
            .await
            .insert(simulation.id.clone(), simulation);
    }

    async fn get(&self, id: &str) -> Option<Simulation> {
        self.simulations.read().await.get(id).cloned()
    }

    async fn update(&self, simulation: Simulation) {
        self.simulations
            .write()
            .await
            .insert(simulation.id.clone(), simulation);
    }

    async fn remove(&self, id: &str) -> bool {
        self.simulations.write().await.remove(id).is_some()
    }

    async fn count(&self) -> usize {
        self.simulations.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simclin_schema::{ClinicalCase, Patient};

    fn simulation(id: &str) -> Simulation {
        Simulation::new(ClinicalCase {
            id: id.into(),
            especialidad: "urgencia".into(),
            nivel_dificultad: "medio".into(),
            aps_subcategoria: None,
            paciente: Patient {
                nombre: "N".into(),
                edad: 1,
                sexo: "m".into(),
                ocupacion: "".into(),
                contexto_ingreso: "".into(),
            },
            motivo_consulta: "tos".into(),
            sintomas: vec![],
            antecedentes: Default::default(),
            examen_fisico: Default::default(),
            examenes: Default::default(),
            diagnostico_principal: "d".into(),
            diagnosticos_diferenciales: vec![],
            info_oculta: vec![],
            info_prohibida: vec![],
        })
    }

    #[tokio::test]
    async fn insert_get_remove_roundtrip() {
        let store = InMemoryStore::new();
        store.insert(simulation("s1")).await;
        assert_eq!(store.count().await, 1);
        assert!(store.get("s1").await.is_some());
        assert!(store.get("s2").await.is_none());
        assert!(store.remove("s1").await);
        assert!(!store.remove("s1").await);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn update_replaces_existing() {
        let store = InMemoryStore::new();
        store.insert(simulation("s1")).await;
        let mut sim = store.get("s1").await.unwrap();
        sim.chat_history.push(simclin_schema::ChatMessage::user("hola"));
        store.update(sim).await;
        assert_eq!(store.get("s1").await.unwrap().chat_history.len(), 1);
        assert_eq!(store.count().await, 1);
    }
}
