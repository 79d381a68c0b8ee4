//! Record and record-set types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The persisted unit of a table: primary-key value → record.
///
/// Invariant (maintained by the store, not enforced here): every map
/// key equals the value of that record's primary-key field at the time
/// of last write.
pub type RecordSet = BTreeMap<String, Record>;

/// A single record: an unordered map from field name to field value.
///
/// Values are kept in their persisted form (strings). Typed
/// interpretation for join comparison happens through
/// [`FieldValue`](crate::FieldValue) at read time. A record has no
/// identity of its own; identity is the value under the owning table's
/// primary-key field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, if present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Sets a field value, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field)
    }

    /// Returns true if the record holds the given field.
    #[must_use]
    pub fn contains_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over (field, value) pairs in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut record = Record::new();
        record.set("name", "alice");

        assert_eq!(record.get("name"), Some("alice"));
        assert_eq!(record.get("missing"), None);
        assert!(record.contains_field("name"));
    }

    #[test]
    fn set_replaces() {
        let mut record = Record::new();
        record.set("dept", "x");
        record.set("dept", "y");

        assert_eq!(record.get("dept"), Some("y"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn remove_field() {
        let mut record = Record::new();
        record.set("a", "1");

        assert_eq!(record.remove("a"), Some("1".to_string()));
        assert!(record.is_empty());
        assert_eq!(record.remove("a"), None);
    }

    #[test]
    fn fields_iterate_in_name_order() {
        let mut record = Record::new();
        record.set("b", "2");
        record.set("a", "1");
        record.set("c", "3");

        let names: Vec<&str> = record.fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn from_iterator() {
        let record: Record = vec![
            ("id".to_string(), "1".to_string()),
            ("name".to_string(), "bob".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(record.len(), 2);
        assert_eq!(record.get("name"), Some("bob"));
    }
}
