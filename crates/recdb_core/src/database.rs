//! A database: a directory of encrypted tables plus a manifest.

use crate::crypto::CryptoManager;
use crate::error::{CoreError, CoreResult};
use crate::manifest::Manifest;
use crate::table::Table;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// File extension for table files.
pub const TABLE_EXT: &str = "tbl";

/// A named collection of tables sharing one directory and one key.
///
/// All tables of a database live as `<table>.tbl` files directly
/// under the database directory. The set of tables and their
/// primary-key fields is tracked in the [`Manifest`], so reopening
/// the database restores every table with its original contract.
#[derive(Debug)]
pub struct Database {
    name: String,
    dir: PathBuf,
    crypto: Arc<CryptoManager>,
    tables: RwLock<HashMap<String, Arc<Table>>>,
    manifest: RwLock<Manifest>,
}

impl Database {
    /// Creates the database directory and an empty manifest.
    ///
    /// Fails with [`CoreError::DatabaseExists`] if the directory is
    /// already present.
    pub fn create(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        crypto: Arc<CryptoManager>,
    ) -> CoreResult<Self> {
        let name = name.into();
        let dir = dir.into();
        if dir.exists() {
            return Err(CoreError::database_exists(name));
        }
        std::fs::create_dir_all(&dir)?;

        let manifest = Manifest::default();
        manifest.save(&dir)?;
        debug!(database = %name, "created database");

        Ok(Self {
            name,
            dir,
            crypto,
            tables: RwLock::new(HashMap::new()),
            manifest: RwLock::new(manifest),
        })
    }

    /// Opens an existing database directory, restoring every table
    /// listed in the manifest.
    pub fn open(
        name: impl Into<String>,
        dir: impl Into<PathBuf>,
        crypto: Arc<CryptoManager>,
    ) -> CoreResult<Self> {
        let name = name.into();
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(CoreError::database_not_found(name));
        }

        let manifest = Manifest::load(&dir)?;
        let mut tables = HashMap::new();
        for (table_name, primary_key) in manifest.tables() {
            let table = Table::new(
                table_name,
                primary_key,
                Self::table_path(&dir, table_name),
                Arc::clone(&crypto),
            )?;
            tables.insert(table_name.to_string(), Arc::new(table));
        }
        debug!(database = %name, tables = tables.len(), "opened database");

        Ok(Self {
            name,
            dir,
            crypto,
            tables: RwLock::new(tables),
            manifest: RwLock::new(manifest),
        })
    }

    /// The database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory backing this database.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates a table keyed by `primary_key` and records it in the
    /// manifest.
    pub fn create_table(&self, name: &str, primary_key: &str) -> CoreResult<Arc<Table>> {
        validate_name(name)?;
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(CoreError::table_exists(name));
        }

        let table = Arc::new(Table::new(
            name,
            primary_key,
            Self::table_path(&self.dir, name),
            Arc::clone(&self.crypto),
        )?);

        let mut manifest = self.manifest.write();
        manifest.add_table(name, primary_key);
        manifest.save(&self.dir)?;

        tables.insert(name.to_string(), Arc::clone(&table));
        debug!(database = %self.name, table = %name, %primary_key, "created table");
        Ok(table)
    }

    /// Looks up a table by name.
    pub fn table(&self, name: &str) -> CoreResult<Arc<Table>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::table_not_found(name))
    }

    /// Drops a table, deleting its file and manifest entry.
    pub fn drop_table(&self, name: &str) -> CoreResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .remove(name)
            .ok_or_else(|| CoreError::table_not_found(name))?;

        let mut manifest = self.manifest.write();
        manifest.remove_table(name);
        manifest.save(&self.dir)?;

        let path = Self::table_path(&self.dir, name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        drop(table);
        debug!(database = %self.name, table = %name, "dropped table");
        Ok(())
    }

    /// Names of all tables, sorted.
    #[must_use]
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn table_path(dir: &Path, table: &str) -> PathBuf {
        dir.join(format!("{table}.{TABLE_EXT}"))
    }
}

/// Validates a database or table name.
///
/// Names become file and directory names, so they are restricted to
/// ASCII alphanumerics, `_` and `-`, and must be non-empty.
pub fn validate_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::invalid_format("name must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CoreError::invalid_format(format!(
            "invalid name {name:?}: only ASCII alphanumerics, '_' and '-' are allowed"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;
    use recdb_codec::Record;
    use tempfile::TempDir;

    fn crypto() -> Arc<CryptoManager> {
        Arc::new(CryptoManager::new(EncryptionKey::generate()))
    }

    #[test]
    fn create_then_open_restores_tables() {
        let dir = TempDir::new().unwrap();
        let db_dir = dir.path().join("app");
        let key = EncryptionKey::generate();

        {
            let db = Database::create(
                "app",
                &db_dir,
                Arc::new(CryptoManager::new(key.clone())),
            )
            .unwrap();
            let users = db.create_table("users", "id").unwrap();
            let mut r = Record::new();
            r.set("id", "u1");
            users.insert(r).unwrap();
        }

        let db = Database::open("app", &db_dir, Arc::new(CryptoManager::new(key))).unwrap();
        let users = db.table("users").unwrap();
        assert_eq!(users.primary_key(), "id");
        assert!(users.select("u1").unwrap().is_some());
    }

    #[test]
    fn create_over_existing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let db_dir = dir.path().join("app");
        Database::create("app", &db_dir, crypto()).unwrap();

        let err = Database::create("app", &db_dir, crypto()).unwrap_err();
        assert!(matches!(err, CoreError::DatabaseExists { .. }));
    }

    #[test]
    fn open_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = Database::open("ghost", dir.path().join("ghost"), crypto()).unwrap_err();
        assert!(matches!(err, CoreError::DatabaseNotFound { .. }));
    }

    #[test]
    fn duplicate_table_fails() {
        let dir = TempDir::new().unwrap();
        let db = Database::create("app", dir.path().join("app"), crypto()).unwrap();
        db.create_table("users", "id").unwrap();

        let err = db.create_table("users", "id").unwrap_err();
        assert!(matches!(err, CoreError::TableExists { .. }));
    }

    #[test]
    fn drop_table_removes_file_and_listing() {
        let dir = TempDir::new().unwrap();
        let db = Database::create("app", dir.path().join("app"), crypto()).unwrap();
        db.create_table("users", "id").unwrap();
        let path = dir.path().join("app").join("users.tbl");
        assert!(path.exists());

        db.drop_table("users").unwrap();
        assert!(!path.exists());
        assert!(db.list_tables().is_empty());
        assert!(matches!(
            db.table("users").unwrap_err(),
            CoreError::TableNotFound { .. }
        ));
    }

    #[test]
    fn list_tables_is_sorted() {
        let dir = TempDir::new().unwrap();
        let db = Database::create("app", dir.path().join("app"), crypto()).unwrap();
        db.create_table("zebra", "id").unwrap();
        db.create_table("alpha", "id").unwrap();

        assert_eq!(db.list_tables(), vec!["alpha", "zebra"]);
    }

    #[test]
    fn invalid_table_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let db = Database::create("app", dir.path().join("app"), crypto()).unwrap();

        let err = db.create_table("../escape", "id").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }
}
