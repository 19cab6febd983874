// src/source/fs.rs

//! Filesystem-backed record source
//!
//! Layout:
//!
//! ```text
//! <base_dir>/
//!   2024-03-01_06-00-00/
//!     invoices.json
//!     Items.json
//!     CONTACTS.json
//!   2024-03-02_06-00-00/
//!     ...
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{extract_records, Generation, LoadedEntity, RecordSource};
use crate::error::{Error, Result};

/// Reads generations from a directory of timestamped subdirectories
#[derive(Debug, Clone)]
pub struct FsRecordSource {
    base_dir: PathBuf,
}

impl FsRecordSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding one generation
    pub fn generation_dir(&self, generation: &Generation) -> PathBuf {
        self.base_dir.join(generation.as_str())
    }

    /// First existing file among `{entity}.json`, `{Entity}.json`, `{ENTITY}.json`
    fn entity_file(&self, generation: &Generation, entity_name: &str) -> Option<PathBuf> {
        let dir = self.generation_dir(generation);
        candidate_file_names(entity_name)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

fn candidate_file_names(entity_name: &str) -> Vec<String> {
    let mut chars = entity_name.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    let mut names = vec![
        format!("{entity_name}.json"),
        format!("{capitalized}.json"),
        format!("{}.json", entity_name.to_uppercase()),
    ];
    names.dedup();
    names
}

impl RecordSource for FsRecordSource {
    fn list_generations(&self) -> Result<Vec<Generation>> {
        if !self.base_dir.is_dir() {
            return Err(Error::NoGenerationsAvailable(self.describe()));
        }

        let mut generations = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            match name.to_str().and_then(Generation::parse) {
                Some(generation) => generations.push(generation),
                None => debug!("Ignoring non-generation directory {:?}", name),
            }
        }

        generations.sort_by(|a, b| b.cmp(a));
        Ok(generations)
    }

    fn load(&self, entity_name: &str, generation: Option<&Generation>) -> Result<LoadedEntity> {
        let generation = match generation {
            Some(g) => g.clone(),
            None => self.resolve_generation(None)?,
        };

        let Some(path) = self.entity_file(&generation, entity_name) else {
            let warning = format!(
                "{entity_name}: no extract file in generation {generation}, loading zero records"
            );
            warn!("{}", warning);
            return Ok(LoadedEntity::empty(entity_name, generation, warning));
        };

        debug!("Loading {} from {}", entity_name, path.display());
        let content = fs::read_to_string(&path)?;
        let payload = serde_json::from_str(&content).map_err(|e| Error::ParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (records, warnings) = extract_records(entity_name, payload);
        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(LoadedEntity {
            entity_name: entity_name.to_string(),
            generation,
            records,
            warnings,
        })
    }

    fn describe(&self) -> String {
        self.base_dir.display().to_string()
    }
}
