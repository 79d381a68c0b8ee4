//! Delete command implementation.

use recdb_core::Server;

/// Runs the delete command.
pub fn run(
    server: &Server,
    database: &str,
    table: &str,
    key: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = server.database(database)?.table(table)?;
    table.delete(key)?;
    println!("Deleted record '{key}'");
    Ok(())
}
