//! Command implementations.

pub mod create_db;
pub mod create_table;
pub mod delete;
pub mod insert;
pub mod inspect;
pub mod join;
pub mod select;
pub mod update;

use recdb_core::{Config, CoreError, Record, Server};
use std::path::Path;

/// Opens the server root with the key source picked from the CLI.
pub fn open_server(
    root: &Path,
    passphrase: Option<String>,
) -> Result<Server, Box<dyn std::error::Error>> {
    let config = match passphrase {
        Some(passphrase) => Config::new().passphrase(passphrase),
        None => Config::default(),
    };
    Ok(Server::open(root, config)?)
}

/// Converts a JSON object into a record.
///
/// Only scalar values are representable: strings are taken as-is,
/// booleans and numbers are stored in their canonical text form.
/// Nulls, arrays and nested objects are rejected.
pub fn record_from_json(json: &str) -> Result<Record, Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let object = value
        .as_object()
        .ok_or("record must be a JSON object of scalar fields")?;

    let mut record = Record::new();
    for (field, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => return Err(Box::new(CoreError::unsupported_value(field))),
        };
        record.set(field, text);
    }
    Ok(record)
}

/// Renders a record as a JSON object.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = record
        .fields()
        .map(|(field, value)| (field.to_string(), serde_json::Value::String(value.to_string())))
        .collect();
    serde_json::Value::Object(map)
}
