//! Select command implementation.

use crate::commands::record_to_json;
use recdb_core::{CoreError, Record, Server};

/// Runs the select command.
///
/// With a key, prints that record or fails with a not-found error.
/// Without one, dumps the whole table in primary-key order.
pub fn run(
    server: &Server,
    database: &str,
    table: &str,
    key: Option<&str>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = server.database(database)?.table(table)?;

    match key {
        Some(key) => {
            let record = table
                .select(key)?
                .ok_or_else(|| CoreError::record_not_found(key))?;
            print_record(key, &record, format)?;
        }
        None => {
            let records = table.select_all()?;
            match format {
                "json" => {
                    let rows: Vec<serde_json::Value> =
                        records.iter().map(record_to_json).collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
                _ => {
                    for record in &records {
                        let key = record.get(table.primary_key()).unwrap_or("?");
                        print_record(key, record, format)?;
                    }
                    println!("{} record(s)", records.len());
                }
            }
        }
    }
    Ok(())
}

fn print_record(
    key: &str,
    record: &Record,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&record_to_json(record))?),
        _ => {
            let fields: Vec<String> = record
                .fields()
                .map(|(field, value)| format!("{field}={value}"))
                .collect();
            println!("{key}: {}", fields.join(", "));
        }
    }
    Ok(())
}
