//! Per-database manifest.
//!
//! The manifest records which primary-key field each table was created
//! with, so reopening a database restores the same table contracts.
//! It is a small CBOR file named `MANIFEST` in the database directory,
//! rewritten in full on every change.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the manifest inside a database directory.
pub const MANIFEST_FILE: &str = "MANIFEST";

/// Table name to primary-key field, for one database.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Manifest {
    tables: BTreeMap<String, String>,
}

impl Manifest {
    /// Loads the manifest from `dir`, or an empty one if the file
    /// does not exist yet.
    pub fn load(dir: &Path) -> CoreResult<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = std::fs::read(&path)?;
        let manifest = ciborium::from_reader(bytes.as_slice())
            .map_err(|e| CoreError::invalid_format(format!("manifest: {e}")))?;
        Ok(manifest)
    }

    /// Writes the manifest to `dir`, replacing any existing file.
    pub fn save(&self, dir: &Path) -> CoreResult<()> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| CoreError::invalid_format(format!("manifest: {e}")))?;
        std::fs::write(Self::path(dir), buf)?;
        Ok(())
    }

    /// Path of the manifest file under `dir`.
    #[must_use]
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    /// Records a table and its primary-key field.
    pub fn add_table(&mut self, name: impl Into<String>, primary_key: impl Into<String>) {
        self.tables.insert(name.into(), primary_key.into());
    }

    /// Forgets a table. Returns whether it was present.
    pub fn remove_table(&mut self, name: &str) -> bool {
        self.tables.remove(name).is_some()
    }

    /// The primary-key field a table was created with.
    #[must_use]
    pub fn primary_key(&self, name: &str) -> Option<&str> {
        self.tables.get(name).map(String::as_str)
    }

    /// Iterates over `(table, primary_key)` pairs in name order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables
            .iter()
            .map(|(name, pk)| (name.as_str(), pk.as_str()))
    }

    /// Whether a table is recorded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}
