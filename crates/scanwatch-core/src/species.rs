//! Species name lookup.
//!
//! The lookup is total: ids missing from the table get a placeholder name so
//! that stats and listings keep working when the table drifts from the game.

use std::collections::BTreeMap;
use std::path::Path;

use scanwatch_types::SpeciesId;

/// Errors that can occur when loading a species table.
#[derive(Debug, thiserror::Error)]
pub enum SpeciesError {
    /// The table file could not be read.
    #[error("failed to read species table: {0}")]
    Io(#[from] std::io::Error),

    /// The table is not a JSON object of strings.
    #[error("failed to parse species table: {0}")]
    Json(#[from] serde_json::Error),

    /// A table key is not a species id.
    #[error("invalid species id in table: {0}")]
    InvalidId(String),
}

/// Maps species ids to display names.
pub trait SpeciesNames: Send + Sync {
    /// Display name of `species`. Never fails.
    fn name_for(&self, species: SpeciesId) -> String;
}

impl<F> SpeciesNames for F
where
    F: Fn(SpeciesId) -> String + Send + Sync,
{
    fn name_for(&self, species: SpeciesId) -> String {
        self(species)
    }
}

/// Name used for ids the table does not know.
pub fn placeholder_name(species: SpeciesId) -> String {
    format!("Unknown #{species}")
}

/// In-memory species table loaded from `{"1": "Bulbasaur", ...}` JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeciesTable {
    names: BTreeMap<SpeciesId, String>,
}

impl SpeciesTable {
    /// An empty table; every lookup yields the placeholder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object keyed by decimal species id.
    ///
    /// # Errors
    ///
    /// Returns [`SpeciesError::Json`] if the JSON is not an object of
    /// strings, or [`SpeciesError::InvalidId`] if a key is not a number.
    pub fn from_json(json: &str) -> Result<Self, SpeciesError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        let mut names = BTreeMap::new();
        for (key, name) in raw {
            let id = key
                .trim()
                .parse::<u32>()
                .map_err(|e| SpeciesError::InvalidId(format!("{key}: {e}")))?;
            names.insert(SpeciesId(id), name);
        }
        Ok(Self { names })
    }

    /// Load a table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SpeciesError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SpeciesError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), species = table.len(), "species table loaded");
        Ok(table)
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, species: SpeciesId, name: impl Into<String>) {
        self.names.insert(species, name.into());
    }

    /// Number of named species.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl SpeciesNames for SpeciesTable {
    fn name_for(&self, species: SpeciesId) -> String {
        self.names
            .get(&species)
            .cloned()
            .unwrap_or_else(|| placeholder_name(species))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_falls_back_to_placeholder() {
        let table = SpeciesTable::from_json(r#"{"1": "Bulbasaur", "25": "Pikachu"}"#)
            .unwrap_or_default();
        assert_eq!(table.len(), 2);
        assert_eq!(table.name_for(SpeciesId(25)), "Pikachu");
        assert_eq!(table.name_for(SpeciesId(999)), "Unknown #999");
    }

    #[test]
    fn rejects_non_numeric_keys() {
        let result = SpeciesTable::from_json(r#"{"pika": "Pikachu"}"#);
        assert!(matches!(result, Err(SpeciesError::InvalidId(_))));
    }

    #[test]
    fn closures_are_name_sources() {
        let names = |id: SpeciesId| format!("species-{id}");
        assert_eq!(names.name_for(SpeciesId(3)), "species-3");
    }

    #[test]
    fn insert_overrides() {
        let mut table = SpeciesTable::new();
        assert!(table.is_empty());
        table.insert(SpeciesId(7), "Squirtle");
        assert_eq!(table.name_for(SpeciesId(7)), "Squirtle");
    }
}
