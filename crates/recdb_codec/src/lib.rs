//! # RecDB Codec
//!
//! Record model and CBOR serialization for RecDB.
//!
//! A table's persisted unit is a [`RecordSet`]: a map from primary-key
//! string to [`Record`] (a field-name → field-value map, with values in
//! their persisted string form). This crate owns that model and its
//! on-disk encoding:
//!
//! - `BTreeMap`-backed maps, so identical record sets always encode to
//!   identical bytes
//! - CBOR via `ciborium` for the byte-level format
//! - Exact round-trip: `decode(encode(set)) == set`
//!
//! Typed interpretation of field values happens at read time through
//! [`FieldValue`], which parses the persisted string form into the
//! closed scalar variant used for join comparison.
//!
//! ## Usage
//!
//! ```
//! use recdb_codec::{Record, RecordSet, encode_record_set, decode_record_set};
//!
//! let mut record = Record::new();
//! record.set("id", "u1");
//! record.set("name", "alice");
//!
//! let mut set = RecordSet::new();
//! set.insert("u1".to_string(), record);
//!
//! let bytes = encode_record_set(&set).unwrap();
//! let decoded = decode_record_set(&bytes).unwrap();
//! assert_eq!(set, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod record;
mod value;

pub use error::{CodecError, CodecResult};
pub use record::{Record, RecordSet};
pub use value::FieldValue;

/// Encodes a record set to CBOR bytes.
///
/// The encoding is deterministic: the same record set always produces
/// the same bytes.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serialization fails.
pub fn encode_record_set(set: &RecordSet) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(set, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Decodes a record set from CBOR bytes.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the bytes are not valid
/// CBOR or do not have the record-set shape.
pub fn decode_record_set(bytes: &[u8]) -> CodecResult<RecordSet> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}
