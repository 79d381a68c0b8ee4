//! Secondary field-value indexes.

use recdb_codec::Record;
use std::collections::HashMap;

/// In-memory secondary indexes for one table.
///
/// Maps field name → observed field value → the record that currently
/// holds that value. This is a derived cache: it is rebuilt from the
/// decrypted record set on load and kept consistent incrementally on
/// every mutation, and it is never the source of truth.
///
/// # Collision policy
///
/// When two distinct records hold the same (field, value) pair, the
/// bucket keeps only the most recently written record. Lookups by a
/// non-unique field therefore observe a single record per value; the
/// join engine inherits this and matches one row per distinct value.
#[derive(Debug, Default)]
pub struct FieldIndexes {
    entries: HashMap<String, HashMap<String, Record>>,
}

impl FieldIndexes {
    /// Creates an empty index set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every (field, value) pair of a record.
    pub fn insert_record(&mut self, record: &Record) {
        for (field, value) in record.fields() {
            self.set(field, value, record.clone());
        }
    }

    /// Removes every (field, value) entry owned by a record.
    pub fn remove_record(&mut self, record: &Record) {
        for (field, value) in record.fields() {
            self.remove_entry(field, value);
        }
    }

    /// Installs a single index entry, replacing any previous owner.
    pub fn set(&mut self, field: &str, value: &str, record: Record) {
        self.entries
            .entry(field.to_string())
            .or_default()
            .insert(value.to_string(), record);
    }

    /// Removes a single index entry.
    pub fn remove_entry(&mut self, field: &str, value: &str) {
        if let Some(bucket) = self.entries.get_mut(field) {
            bucket.remove(value);
            if bucket.is_empty() {
                self.entries.remove(field);
            }
        }
    }

    /// Looks up the record currently indexed under (field, value).
    #[must_use]
    pub fn get(&self, field: &str, value: &str) -> Option<&Record> {
        self.entries.get(field)?.get(value)
    }

    /// Returns the records reachable through a field's bucket, one per
    /// distinct observed value.
    #[must_use]
    pub fn bucket_records(&self, field: &str) -> Vec<Record> {
        match self.entries.get(field) {
            Some(bucket) => bucket.values().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Returns the number of distinct values indexed under a field.
    #[must_use]
    pub fn bucket_len(&self, field: &str) -> usize {
        self.entries.get(field).map_or(0, HashMap::len)
    }

    /// Returns the number of indexed fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rebuilds the indexes from a full record scan.
    pub fn rebuild<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a Record>,
    {
        self.clear();
        for record in records {
            self.insert_record(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (field, value) in pairs {
            r.set(*field, *value);
        }
        r
    }

    #[test]
    fn insert_and_get() {
        let mut indexes = FieldIndexes::new();
        let r = record(&[("id", "u1"), ("dept", "x")]);

        indexes.insert_record(&r);

        assert_eq!(indexes.get("id", "u1"), Some(&r));
        assert_eq!(indexes.get("dept", "x"), Some(&r));
        assert_eq!(indexes.get("dept", "y"), None);
        assert_eq!(indexes.field_count(), 2);
    }

    #[test]
    fn remove_record_drops_all_entries() {
        let mut indexes = FieldIndexes::new();
        let r = record(&[("id", "u1"), ("dept", "x")]);

        indexes.insert_record(&r);
        indexes.remove_record(&r);

        assert!(indexes.is_empty());
    }

    #[test]
    fn last_writer_wins_on_collision() {
        let mut indexes = FieldIndexes::new();
        let first = record(&[("id", "u1"), ("dept", "x")]);
        let second = record(&[("id", "u2"), ("dept", "x")]);

        indexes.insert_record(&first);
        indexes.insert_record(&second);

        // Both ids are indexed, but the shared dept value keeps only
        // the most recently written record.
        assert_eq!(indexes.get("id", "u1"), Some(&first));
        assert_eq!(indexes.get("id", "u2"), Some(&second));
        assert_eq!(indexes.get("dept", "x"), Some(&second));
        assert_eq!(indexes.bucket_len("dept"), 1);
    }

    #[test]
    fn remove_entry_prunes_empty_bucket() {
        let mut indexes = FieldIndexes::new();
        indexes.set("dept", "x", record(&[("dept", "x")]));

        indexes.remove_entry("dept", "x");

        assert_eq!(indexes.field_count(), 0);
        // Removing again is a no-op.
        indexes.remove_entry("dept", "x");
    }

    #[test]
    fn bucket_records_one_per_value() {
        let mut indexes = FieldIndexes::new();
        indexes.insert_record(&record(&[("id", "u1"), ("dept", "x")]));
        indexes.insert_record(&record(&[("id", "u2"), ("dept", "y")]));

        let bucket = indexes.bucket_records("dept");
        assert_eq!(bucket.len(), 2);
        assert!(indexes.bucket_records("missing").is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_state() {
        let mut indexes = FieldIndexes::new();
        indexes.insert_record(&record(&[("id", "old")]));

        let records = vec![
            record(&[("id", "u1"), ("dept", "x")]),
            record(&[("id", "u2"), ("dept", "y")]),
        ];
        indexes.rebuild(records.iter());

        assert_eq!(indexes.get("id", "old"), None);
        assert_eq!(indexes.bucket_len("id"), 2);
        assert_eq!(indexes.bucket_len("dept"), 2);
    }
}
