//! Two-table join engine.

use crate::error::CoreResult;
use crate::table::Table;
use recdb_codec::{FieldValue, Record};
use std::collections::BTreeMap;

/// Kind of join to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Only matching pairs.
    Inner,
    /// Matching pairs plus unmatched left records.
    Left,
    /// Matching pairs plus unmatched right records.
    Right,
    /// Matching pairs plus unmatched records from both sides.
    FullOuter,
}

/// A merged join result row.
///
/// Field names are prefixed `t1.` or `t2.` by originating side; values
/// carry their typed interpretation.
pub type JoinRow = BTreeMap<String, FieldValue>;

/// Joins two tables on the given key fields.
///
/// Both tables' indexes are rebuilt from disk first, so the join
/// observes the latest flushed state rather than a stale cache. The
/// scan walks each table's index bucket for its key field — one record
/// per distinct observed value, so several records sharing a join-key
/// value collapse to the most recently written one (the index
/// collision policy). Matching compares typed values, so `"1"` and
/// `"1.0"` join as equal numbers.
///
/// Each table's shared lock is taken and released independently while
/// its bucket is copied out; there is no atomic two-table snapshot.
///
/// Complexity is O(|bucket₁| × |bucket₂|), which is fine for the small
/// in-process tables this store targets.
pub fn join_tables(
    t1: &Table,
    t2: &Table,
    key1: &str,
    key2: &str,
    kind: JoinKind,
) -> CoreResult<Vec<JoinRow>> {
    t1.reset_and_load_indexes()?;
    t2.reset_and_load_indexes()?;

    let bucket1 = t1.with_indexes(|ix| ix.bucket_records(key1));
    let bucket2 = t2.with_indexes(|ix| ix.bucket_records(key2));

    let mut results = Vec::new();

    for rec1 in &bucket1 {
        let mut matched = false;
        for rec2 in &bucket2 {
            if keys_match(rec1, key1, rec2, key2) {
                results.push(merge_records(Some(rec1), Some(rec2)));
                matched = true;
            }
        }

        if !matched && matches!(kind, JoinKind::Left | JoinKind::FullOuter) {
            results.push(merge_records(Some(rec1), None));
        }
    }

    if matches!(kind, JoinKind::Right | JoinKind::FullOuter) {
        for rec2 in &bucket2 {
            let matched = bucket1
                .iter()
                .any(|rec1| keys_match(rec1, key1, rec2, key2));
            if !matched {
                results.push(merge_records(None, Some(rec2)));
            }
        }
    }

    Ok(results)
}

/// Typed equality of the two records' join-key values.
fn keys_match(rec1: &Record, key1: &str, rec2: &Record, key2: &str) -> bool {
    match (rec1.get(key1), rec2.get(key2)) {
        (Some(v1), Some(v2)) => FieldValue::parse(v1).matches(&FieldValue::parse(v2)),
        _ => false,
    }
}

/// Merges up to two records into a prefixed, typed result row.
fn merge_records(rec1: Option<&Record>, rec2: Option<&Record>) -> JoinRow {
    let mut row = JoinRow::new();
    if let Some(rec) = rec1 {
        for (field, value) in rec.fields() {
            row.insert(format!("t1.{field}"), FieldValue::parse(value));
        }
    }
    if let Some(rec) = rec2 {
        for (field, value) in rec.fields() {
            row.insert(format!("t2.{field}"), FieldValue::parse(value));
        }
    }
    row
}
