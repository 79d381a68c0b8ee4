//! The server root: top-level entry point owning all databases.
//!
//! A server root is a directory holding one subdirectory per database
//! plus a few bookkeeping files: `LOCK` (advisory exclusive lock held
//! while the server is open), and either `KEY` (the raw encryption
//! key, created on first run) or `SALT` (random salt for
//! passphrase-derived keys).

use crate::config::{Config, KeySource};
use crate::crypto::{CryptoManager, EncryptionKey};
use crate::database::{validate_name, Database};
use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use parking_lot::RwLock;
use rand::RngCore;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// File name of the advisory lock at the server root.
pub const LOCK_FILE: &str = "LOCK";
/// File name of the raw key at the server root.
pub const KEY_FILE: &str = "KEY";
/// File name of the passphrase salt at the server root.
pub const SALT_FILE: &str = "SALT";

const SALT_SIZE: usize = 16;

/// Owns a server root directory and the databases inside it.
///
/// Holds an exclusive advisory lock on the root for its whole
/// lifetime, so at most one process operates on a root at a time.
#[derive(Debug)]
pub struct Server {
    root: PathBuf,
    crypto: Arc<CryptoManager>,
    databases: RwLock<HashMap<String, Arc<Database>>>,
    lock_file: File,
}

impl Server {
    /// Opens (or creates, per `config`) a server root.
    ///
    /// Existing database subdirectories are opened eagerly so that
    /// key problems surface here rather than on first access.
    pub fn open(root: impl Into<PathBuf>, config: Config) -> CoreResult<Self> {
        let root = root.into();

        if root.exists() {
            if config.error_if_exists {
                return Err(CoreError::database_exists(root.display().to_string()));
            }
        } else {
            if !config.create_if_missing {
                return Err(CoreError::database_not_found(root.display().to_string()));
            }
            std::fs::create_dir_all(&root)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(root.join(LOCK_FILE))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| CoreError::ServerLocked)?;

        let key = Self::resolve_key(&root, &config.key_source)?;
        let crypto = Arc::new(CryptoManager::new(key));

        let mut databases = HashMap::new();
        for entry in std::fs::read_dir(&root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let db = Database::open(&name, entry.path(), Arc::clone(&crypto))?;
            databases.insert(name, Arc::new(db));
        }
        info!(root = %root.display(), databases = databases.len(), "server open");

        Ok(Self {
            root,
            crypto,
            databases: RwLock::new(databases),
            lock_file,
        })
    }

    /// The server root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates a new empty database.
    pub fn create_database(&self, name: &str) -> CoreResult<Arc<Database>> {
        validate_name(name)?;
        let mut databases = self.databases.write();
        if databases.contains_key(name) {
            return Err(CoreError::database_exists(name));
        }

        let db = Arc::new(Database::create(
            name,
            self.root.join(name),
            Arc::clone(&self.crypto),
        )?);
        databases.insert(name.to_string(), Arc::clone(&db));
        debug!(database = %name, "created database");
        Ok(db)
    }

    /// Looks up a database by name.
    pub fn database(&self, name: &str) -> CoreResult<Arc<Database>> {
        self.databases
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::database_not_found(name))
    }

    /// Drops a database, deleting its directory and every table in it.
    pub fn drop_database(&self, name: &str) -> CoreResult<()> {
        let mut databases = self.databases.write();
        let db = databases
            .remove(name)
            .ok_or_else(|| CoreError::database_not_found(name))?;

        std::fs::remove_dir_all(db.dir())?;
        drop(db);
        debug!(database = %name, "dropped database");
        Ok(())
    }

    /// Names of all databases, sorted.
    #[must_use]
    pub fn list_databases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn resolve_key(root: &Path, source: &KeySource) -> CoreResult<EncryptionKey> {
        match source {
            KeySource::KeyFile => {
                let path = root.join(KEY_FILE);
                if path.exists() {
                    let bytes = std::fs::read(&path)?;
                    EncryptionKey::from_bytes(&bytes)
                } else {
                    let key = EncryptionKey::generate();
                    std::fs::write(&path, key.as_bytes())?;
                    Ok(key)
                }
            }
            KeySource::Passphrase(passphrase) => {
                let path = root.join(SALT_FILE);
                let salt = if path.exists() {
                    std::fs::read(&path)?
                } else {
                    let mut salt = vec![0u8; SALT_SIZE];
                    rand::thread_rng().fill_bytes(&mut salt);
                    std::fs::write(&path, &salt)?;
                    salt
                };
                EncryptionKey::derive_from_passphrase(passphrase.as_bytes(), &salt)
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recdb_codec::Record;
    use tempfile::TempDir;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (field, value) in pairs {
            r.set(*field, *value);
        }
        r
    }

    #[test]
    fn open_creates_root_and_key_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");

        let _server = Server::open(&root, Config::default()).unwrap();
        assert!(root.join(LOCK_FILE).exists());
        assert!(root.join(KEY_FILE).exists());
    }

    #[test]
    fn open_without_create_if_missing_fails() {
        let dir = TempDir::new().unwrap();
        let err = Server::open(
            dir.path().join("absent"),
            Config::new().create_if_missing(false),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DatabaseNotFound { .. }));
    }

    #[test]
    fn error_if_exists_rejects_existing_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        drop(Server::open(&root, Config::default()).unwrap());

        let err = Server::open(&root, Config::new().error_if_exists(true)).unwrap_err();
        assert!(matches!(err, CoreError::DatabaseExists { .. }));
    }

    #[test]
    fn second_open_on_held_root_is_locked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        let _server = Server::open(&root, Config::default()).unwrap();

        let err = Server::open(&root, Config::default()).unwrap_err();
        assert!(matches!(err, CoreError::ServerLocked));
    }

    #[test]
    fn reopen_restores_databases_and_data() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");

        {
            let server = Server::open(&root, Config::default()).unwrap();
            let db = server.create_database("app").unwrap();
            let users = db.create_table("users", "id").unwrap();
            users
                .insert(record(&[("id", "u1"), ("name", "alice")]))
                .unwrap();
        }

        let server = Server::open(&root, Config::default()).unwrap();
        assert_eq!(server.list_databases(), vec!["app"]);
        let users = server.database("app").unwrap().table("users").unwrap();
        let found = users.select("u1").unwrap().unwrap();
        assert_eq!(found.get("name"), Some("alice"));
    }

    #[test]
    fn passphrase_mode_reopens_with_same_passphrase() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");

        {
            let server =
                Server::open(&root, Config::new().passphrase("correct horse")).unwrap();
            let db = server.create_database("app").unwrap();
            let users = db.create_table("users", "id").unwrap();
            users.insert(record(&[("id", "u1")])).unwrap();
        }
        assert!(root.join(SALT_FILE).exists());
        assert!(!root.join(KEY_FILE).exists());

        let server = Server::open(&root, Config::new().passphrase("correct horse")).unwrap();
        let users = server.database("app").unwrap().table("users").unwrap();
        assert!(users.select("u1").unwrap().is_some());
    }

    #[test]
    fn wrong_passphrase_fails_to_decrypt() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");

        {
            let server =
                Server::open(&root, Config::new().passphrase("correct horse")).unwrap();
            let db = server.create_database("app").unwrap();
            db.create_table("users", "id").unwrap();
        }

        let err = Server::open(&root, Config::new().passphrase("battery staple")).unwrap_err();
        assert!(matches!(err, CoreError::DecryptionFailed { .. }));
    }

    #[test]
    fn duplicate_database_fails() {
        let dir = TempDir::new().unwrap();
        let server = Server::open(dir.path().join("store"), Config::default()).unwrap();
        server.create_database("app").unwrap();

        let err = server.create_database("app").unwrap_err();
        assert!(matches!(err, CoreError::DatabaseExists { .. }));
    }

    #[test]
    fn drop_database_removes_directory() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        let server = Server::open(&root, Config::default()).unwrap();
        server.create_database("app").unwrap();
        assert!(root.join("app").exists());

        server.drop_database("app").unwrap();
        assert!(!root.join("app").exists());
        assert!(server.list_databases().is_empty());
    }

    #[test]
    fn invalid_database_name_is_rejected() {
        let dir = TempDir::new().unwrap();
        let server = Server::open(dir.path().join("store"), Config::default()).unwrap();

        let err = server.create_database("no/slashes").unwrap_err();
        assert!(matches!(err, CoreError::InvalidFormat { .. }));
    }
}
