//! Insert command implementation.

use crate::commands::record_from_json;
use recdb_core::Server;

/// Runs the insert command.
pub fn run(
    server: &Server,
    database: &str,
    table: &str,
    json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = record_from_json(json)?;
    let table = server.database(database)?.table(table)?;
    let key = record
        .get(table.primary_key())
        .unwrap_or("<missing>")
        .to_string();
    table.insert(record)?;
    println!("Inserted record '{key}'");
    Ok(())
}
