//! Update command implementation.

use crate::commands::record_from_json;
use recdb_core::Server;

/// Runs the update command.
pub fn run(
    server: &Server,
    database: &str,
    table: &str,
    key: &str,
    json: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let updates = record_from_json(json)?;
    let table = server.database(database)?.table(table)?;
    table.update(key, updates)?;
    println!("Updated record '{key}'");
    Ok(())
}
