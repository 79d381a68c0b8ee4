//! Create-table command implementation.

use recdb_core::Server;

/// Runs the create-table command.
pub fn run(
    server: &Server,
    database: &str,
    table: &str,
    primary_key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = server.database(database)?;
    db.create_table(table, primary_key)?;
    println!("Created table '{database}.{table}' keyed by '{primary_key}'");
    Ok(())
}
