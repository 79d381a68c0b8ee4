//! Create-db command implementation.

use recdb_core::Server;

/// Runs the create-db command.
pub fn run(server: &Server, database: &str) -> Result<(), Box<dyn std::error::Error>> {
    server.create_database(database)?;
    println!("Created database '{database}'");
    Ok(())
}
