// src/source/memory.rs

//! In-memory record source for tests and embedding.

use std::collections::BTreeMap;

use super::{Generation, LoadedEntity, RecordSource};
use crate::error::{Error, Result};
use crate::record::Record;

/// Generations held in memory: generation -> entity -> records
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordSource {
    generations: BTreeMap<Generation, BTreeMap<String, Vec<Record>>>,
}

impl MemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`
    pub fn with_entity(
        mut self,
        generation: &str,
        entity_name: &str,
        records: Vec<Record>,
    ) -> Result<Self> {
        self.insert(generation, entity_name, records)?;
        Ok(self)
    }

    /// Add (or replace) an entity's records in a generation
    pub fn insert(&mut self, generation: &str, entity_name: &str, records: Vec<Record>) -> Result<()> {
        let generation = Generation::parse(generation).ok_or_else(|| {
            Error::ConfigError(format!("invalid generation identifier: {generation}"))
        })?;
        self.generations
            .entry(generation)
            .or_default()
            .insert(entity_name.to_string(), records);
        Ok(())
    }
}

impl RecordSource for MemoryRecordSource {
    fn list_generations(&self) -> Result<Vec<Generation>> {
        if self.generations.is_empty() {
            return Err(Error::NoGenerationsAvailable(self.describe()));
        }
        Ok(self.generations.keys().rev().cloned().collect())
    }

    fn load(&self, entity_name: &str, generation: Option<&Generation>) -> Result<LoadedEntity> {
        let generation = match generation {
            Some(g) => g.clone(),
            None => self.resolve_generation(None)?,
        };

        let entities = self
            .generations
            .get(&generation)
            .ok_or_else(|| Error::GenerationNotFound(generation.to_string()))?;

        match entities.get(entity_name) {
            Some(records) => Ok(LoadedEntity {
                entity_name: entity_name.to_string(),
                generation,
                records: records.clone(),
                warnings: Vec::new(),
            }),
            None => {
                let warning = format!(
                    "{entity_name}: no records in generation {generation}, loading zero records"
                );
                Ok(LoadedEntity::empty(entity_name, generation, warning))
            }
        }
    }

    fn describe(&self) -> String {
        "in-memory source".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: i64) -> Record {
        [("id", json!(id))].into_iter().collect()
    }

    #[test]
    fn test_empty_source_has_no_generations() {
        let source = MemoryRecordSource::new();
        assert!(matches!(
            source.load("items", None),
            Err(Error::NoGenerationsAvailable(_))
        ));
    }

    #[test]
    fn test_invalid_generation_rejected() {
        let mut source = MemoryRecordSource::new();
        assert!(source.insert("yesterday", "items", vec![]).is_err());
    }

    #[test]
    fn test_latest_generation_wins() {
        let source = MemoryRecordSource::new()
            .with_entity("2024-01-01_00-00-00", "items", vec![record(1)])
            .unwrap()
            .with_entity("2024-02-01_00-00-00", "items", vec![record(1), record(2)])
            .unwrap();

        let generations = source.list_generations().unwrap();
        assert_eq!(generations[0].as_str(), "2024-02-01_00-00-00");

        let loaded = source.load("items", None).unwrap();
        assert_eq!(loaded.records.len(), 2);
    }

    #[test]
    fn test_missing_entity_loads_empty() {
        let source = MemoryRecordSource::new()
            .with_entity("2024-01-01_00-00-00", "items", vec![])
            .unwrap();
        let loaded = source.load("contacts", None).unwrap();
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.warnings.len(), 1);
    }
}
