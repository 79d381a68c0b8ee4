//! Table storage: one encrypted record-set file per table.

use crate::crypto::CryptoManager;
use crate::error::{CoreError, CoreResult};
use crate::index::FieldIndexes;
use parking_lot::RwLock;
use recdb_codec::{decode_record_set, encode_record_set, Record, RecordSet};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// An encrypted table of records.
///
/// A table owns exactly one file holding its encrypted, CBOR-encoded
/// record set, one primary-key field name, and one set of in-memory
/// secondary indexes. Every mutating call re-reads the entire record
/// set from disk, applies the change in memory, and rewrites the whole
/// file; the unit of durability is "whole file, replaced". A crash
/// mid-write can leave a truncated file — that consistency boundary is
/// deliberate, there is no write-ahead log.
///
/// # Concurrency
///
/// All access is serialized through one reader/writer lock composed
/// inside the table: mutations and index rebuilds take the exclusive
/// mode, `select`/`select_all` and join-time index scans take the
/// shared mode. The lock itself is never exposed.
pub struct Table {
    name: String,
    path: PathBuf,
    primary_key: String,
    crypto: Arc<CryptoManager>,
    indexes: RwLock<FieldIndexes>,
}

impl Table {
    /// Opens or creates a table backed by the given file path.
    ///
    /// Creates parent directories and an empty encrypted record set if
    /// the file does not exist; otherwise rebuilds the indexes from
    /// the existing on-disk contents.
    pub fn new(
        name: impl Into<String>,
        primary_key: impl Into<String>,
        path: impl Into<PathBuf>,
        crypto: Arc<CryptoManager>,
    ) -> CoreResult<Self> {
        let table = Self {
            name: name.into(),
            path: path.into(),
            primary_key: primary_key.into(),
            crypto,
            indexes: RwLock::new(FieldIndexes::new()),
        };

        if let Some(parent) = table.path.parent() {
            fs::create_dir_all(parent)?;
        }

        if table.path.exists() {
            table.reset_and_load_indexes()?;
        } else {
            table.write_records(&RecordSet::new())?;
            info!(table = %table.name, path = %table.path.display(), "created table file");
        }

        Ok(table)
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the primary-key field name.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns the path of the table file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts a new record.
    ///
    /// The record must carry the table's primary-key field; its value
    /// becomes the record's identity.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingPrimaryKey`] if the primary-key field is
    ///   absent
    /// - [`CoreError::DuplicateKey`] if the key already exists; the
    ///   record set and indexes are left untouched and no write is
    ///   attempted
    pub fn insert(&self, record: Record) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let mut records = self.read_records()?;

        let key = record
            .get(&self.primary_key)
            .ok_or_else(|| CoreError::missing_primary_key(&self.primary_key))?
            .to_string();
        if records.contains_key(&key) {
            return Err(CoreError::duplicate_key(key));
        }

        records.insert(key, record.clone());
        self.write_records(&records)?;
        indexes.insert_record(&record);
        Ok(())
    }

    /// Updates the specified fields of an existing record.
    ///
    /// Fields not named in `updates` are left untouched in the record.
    /// For each updated field the stale index entry for the old value
    /// is removed before the new value is installed, and every index
    /// entry of the record (unchanged fields included) is refreshed to
    /// the updated record. Updating the primary-key field re-keys the
    /// record under its new identity (failing with
    /// [`CoreError::DuplicateKey`] if that identity is taken), keeping
    /// the map key and the in-record value from diverging.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordNotFound`] if `key` is absent.
    pub fn update(&self, key: &str, updates: Record) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let mut records = self.read_records()?;

        let mut record = records
            .get(key)
            .cloned()
            .ok_or_else(|| CoreError::record_not_found(key))?;

        let mut stale: Vec<(String, String)> = Vec::new();
        for (field, new_value) in updates.fields() {
            if let Some(old_value) = record.get(field) {
                if old_value != new_value {
                    stale.push((field.to_string(), old_value.to_string()));
                }
            }
            record.set(field, new_value);
        }

        let new_key = record
            .get(&self.primary_key)
            .ok_or_else(|| CoreError::missing_primary_key(&self.primary_key))?
            .to_string();
        if new_key != key {
            if records.contains_key(&new_key) {
                return Err(CoreError::duplicate_key(new_key));
            }
            records.remove(key);
        }
        records.insert(new_key, record.clone());

        self.write_records(&records)?;

        for (field, old_value) in &stale {
            indexes.remove_entry(field, old_value);
        }
        // Every entry of the record is refreshed, not just the updated
        // fields: entries are owned clones, so an entry reached through
        // an unchanged field must also carry the new field values.
        for (field, value) in record.fields() {
            indexes.set(field, value, record.clone());
        }
        Ok(())
    }

    /// Deletes a record by primary-key value.
    ///
    /// Removes every index entry the record owned.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordNotFound`] if `key` is absent.
    pub fn delete(&self, key: &str) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let mut records = self.read_records()?;

        let record = records
            .remove(key)
            .ok_or_else(|| CoreError::record_not_found(key))?;

        self.write_records(&records)?;
        indexes.remove_record(&record);
        Ok(())
    }

    /// Returns a record by primary-key value, if present.
    pub fn select(&self, key: &str) -> CoreResult<Option<Record>> {
        let _shared = self.indexes.read();
        let records = self.read_records()?;
        Ok(records.get(key).cloned())
    }

    /// Returns every record in the table, in primary-key order.
    pub fn select_all(&self) -> CoreResult<Vec<Record>> {
        let _shared = self.indexes.read();
        let records = self.read_records()?;
        Ok(records.into_values().collect())
    }

    /// Returns the number of records in the table.
    pub fn count(&self) -> CoreResult<usize> {
        let _shared = self.indexes.read();
        Ok(self.read_records()?.len())
    }

    /// Merges index entries from a full scan of the on-disk record
    /// set into the current index state.
    pub fn load_indexes(&self) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let records = self.read_records()?;
        for record in records.values() {
            indexes.insert_record(record);
        }
        Ok(())
    }

    /// Clears the indexes and rebuilds them from the on-disk record
    /// set.
    ///
    /// Used at startup and before joins, so scans observe the latest
    /// flushed state rather than a possibly stale cache.
    pub fn reset_and_load_indexes(&self) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let records = self.read_records()?;
        indexes.rebuild(records.values());
        Ok(())
    }

    /// Runs a closure against the index state under the shared lock.
    pub fn with_indexes<R>(&self, f: impl FnOnce(&FieldIndexes) -> R) -> R {
        f(&self.indexes.read())
    }

    /// Captures the current on-disk state of the given keys.
    ///
    /// `None` marks a key that is currently absent, so a restore knows to
    /// remove it.
    pub(crate) fn snapshot_records(
        &self,
        keys: &[String],
    ) -> CoreResult<HashMap<String, Option<Record>>> {
        let _shared = self.indexes.read();
        let records = self.read_records()?;
        Ok(keys
            .iter()
            .map(|key| (key.clone(), records.get(key).cloned()))
            .collect())
    }

    /// Restores snapshotted records into the record set, re-persists,
    /// and rebuilds the indexes to match.
    pub(crate) fn restore_snapshot(
        &self,
        snapshot: &HashMap<String, Option<Record>>,
    ) -> CoreResult<()> {
        let mut indexes = self.indexes.write();
        let mut records = self.read_records()?;

        for (key, before) in snapshot {
            match before {
                Some(record) => {
                    records.insert(key.clone(), record.clone());
                }
                None => {
                    records.remove(key);
                }
            }
        }

        self.write_records(&records)?;
        indexes.rebuild(records.values());
        Ok(())
    }

    /// Reads and decrypts the full record set from disk.
    ///
    /// An absent or empty file is an empty record set.
    fn read_records(&self) -> CoreResult<RecordSet> {
        let encrypted = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordSet::new()),
            Err(e) => return Err(e.into()),
        };
        if encrypted.is_empty() {
            return Ok(RecordSet::new());
        }

        let plaintext = self.crypto.decrypt(&encrypted)?;
        Ok(decode_record_set(&plaintext)?)
    }

    /// Serializes, encrypts, and rewrites the whole table file.
    fn write_records(&self, records: &RecordSet) -> CoreResult<()> {
        let plaintext = encode_record_set(records)?;
        let encrypted = self.crypto.encrypt(&plaintext)?;
        fs::write(&self.path, &encrypted)?;
        debug!(table = %self.name, bytes = encrypted.len(), "rewrote table file");
        Ok(())
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::EncryptionKey;
    use tempfile::TempDir;

    fn test_crypto() -> Arc<CryptoManager> {
        Arc::new(CryptoManager::new(EncryptionKey::generate()))
    }

    fn test_table(dir: &TempDir) -> Table {
        Table::new("users", "id", dir.path().join("users.tbl"), test_crypto()).unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (field, value) in pairs {
            r.set(*field, *value);
        }
        r
    }

    #[test]
    fn insert_then_select_all() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table
            .insert(record(&[("id", "u1"), ("name", "alice"), ("age", "30")]))
            .unwrap();

        let all = table.select_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("id"), Some("u1"));
        assert_eq!(all[0].get("name"), Some("alice"));
        assert_eq!(all[0].get("age"), Some("30"));
    }

    #[test]
    fn insert_duplicate_key_fails_and_leaves_state() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table.insert(record(&[("id", "u1"), ("name", "alice")])).unwrap();
        let before = fs::read(table.path()).unwrap();

        let err = table
            .insert(record(&[("id", "u1"), ("name", "imposter")]))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));

        // No write happened: the file is byte-identical.
        assert_eq!(fs::read(table.path()).unwrap(), before);
        let all = table.select_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("name"), Some("alice"));
        table.with_indexes(|ix| {
            assert_eq!(ix.get("name", "imposter"), None);
        });
    }

    #[test]
    fn insert_without_primary_key_fails() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        let err = table.insert(record(&[("name", "nobody")])).unwrap_err();
        assert!(matches!(err, CoreError::MissingPrimaryKey { .. }));
        assert!(table.select_all().unwrap().is_empty());
    }

    #[test]
    fn update_missing_key_fails() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        let err = table.update("ghost", record(&[("name", "x")])).unwrap_err();
        assert!(matches!(err, CoreError::RecordNotFound { .. }));
    }

    #[test]
    fn update_changes_only_named_fields() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table
            .insert(record(&[("id", "u1"), ("name", "alice"), ("dept", "x")]))
            .unwrap();
        table.update("u1", record(&[("dept", "y")])).unwrap();

        let updated = table.select("u1").unwrap().unwrap();
        assert_eq!(updated.get("name"), Some("alice"));
        assert_eq!(updated.get("dept"), Some("y"));

        // Stale index entry for the old value is gone, new one present.
        table.with_indexes(|ix| {
            assert_eq!(ix.get("dept", "x"), None);
            assert!(ix.get("dept", "y").is_some());
            assert!(ix.get("name", "alice").is_some());
        });
    }

    #[test]
    fn update_refreshes_index_entries_of_unchanged_fields() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table
            .insert(record(&[("id", "u1"), ("name", "alice"), ("dept", "x")]))
            .unwrap();
        table.update("u1", record(&[("dept", "y")])).unwrap();

        // An entry reached through a field the update never named must
        // still hold the post-update record.
        table.with_indexes(|ix| {
            let via_name = ix.get("name", "alice").unwrap();
            assert_eq!(via_name.get("dept"), Some("y"));
            let via_id = ix.get("id", "u1").unwrap();
            assert_eq!(via_id.get("dept"), Some("y"));
        });
    }

    #[test]
    fn update_rekeys_primary_key() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table.insert(record(&[("id", "u1"), ("name", "alice")])).unwrap();
        table.update("u1", record(&[("id", "u9")])).unwrap();

        assert!(table.select("u1").unwrap().is_none());
        let moved = table.select("u9").unwrap().unwrap();
        assert_eq!(moved.get("name"), Some("alice"));
    }

    #[test]
    fn update_rekey_onto_existing_key_fails() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table.insert(record(&[("id", "u1")])).unwrap();
        table.insert(record(&[("id", "u2")])).unwrap();

        let err = table.update("u1", record(&[("id", "u2")])).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateKey { .. }));
        assert!(table.select("u1").unwrap().is_some());
    }

    #[test]
    fn delete_removes_record_and_index_entries() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        table
            .insert(record(&[("id", "u1"), ("dept", "x")]))
            .unwrap();
        table.delete("u1").unwrap();

        assert!(table.select_all().unwrap().is_empty());
        table.with_indexes(|ix| assert!(ix.is_empty()));

        let err = table.delete("u1").unwrap_err();
        assert!(matches!(err, CoreError::RecordNotFound { .. }));
    }

    #[test]
    fn absent_and_empty_files_are_empty_sets() {
        let dir = TempDir::new().unwrap();
        let table = test_table(&dir);

        fs::remove_file(table.path()).unwrap();
        assert!(table.select_all().unwrap().is_empty());

        fs::write(table.path(), b"").unwrap();
        assert!(table.select_all().unwrap().is_empty());
    }

    #[test]
    fn reopen_rebuilds_indexes_from_disk() {
        let dir = TempDir::new().unwrap();
        let crypto = test_crypto();
        let path = dir.path().join("users.tbl");

        let table = Table::new("users", "id", &path, Arc::clone(&crypto)).unwrap();
        table
            .insert(record(&[("id", "u1"), ("dept", "x")]))
            .unwrap();
        drop(table);

        let reopened = Table::new("users", "id", &path, crypto).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
        reopened.with_indexes(|ix| {
            assert!(ix.get("dept", "x").is_some());
            assert!(ix.get("id", "u1").is_some());
        });
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.tbl");

        let table = Table::new("users", "id", &path, test_crypto()).unwrap();
        table.insert(record(&[("id", "u1")])).unwrap();
        drop(table);

        let err = Table::new("users", "id", &path, test_crypto()).unwrap_err();
        assert!(matches!(err, CoreError::DecryptionFailed { .. }));
    }

    #[test]
    fn concurrent_readers_do_not_block_each_other() {
        let dir = TempDir::new().unwrap();
        let table = Arc::new(test_table(&dir));

        for i in 0..8 {
            let key = format!("u{i}");
            table
                .insert(record(&[("id", key.as_str()), ("dept", "x")]))
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let table = Arc::clone(&table);
            handles.push(std::thread::spawn(move || {
                for _ in 0..20 {
                    let all = table.select_all().unwrap();
                    // Readers never observe a half-applied mutation:
                    // every record is complete.
                    for r in &all {
                        assert!(r.contains_field("id"));
                        assert!(r.contains_field("dept"));
                    }
                }
            }));
        }

        for i in 8..16 {
            let key = format!("u{i}");
            table
                .insert(record(&[("id", key.as_str()), ("dept", "y")]))
                .unwrap();
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(table.count().unwrap(), 16);
    }
}
