//! Inspect command implementation.

use recdb_core::{Server, TABLE_EXT};
use serde::Serialize;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Server root path.
    pub root: String,
    /// Number of databases.
    pub database_count: usize,
    /// Total on-disk size of all table files in bytes.
    pub total_size: u64,
    /// Per-database statistics.
    pub databases: Vec<DatabaseStats>,
}

/// Statistics for a single database.
#[derive(Debug, Serialize)]
pub struct DatabaseStats {
    /// Database name.
    pub name: String,
    /// Per-table statistics.
    pub tables: Vec<TableStats>,
}

/// Statistics for a single table.
#[derive(Debug, Serialize)]
pub struct TableStats {
    /// Table name.
    pub name: String,
    /// Primary-key field.
    pub primary_key: String,
    /// Number of records.
    pub record_count: usize,
    /// Encrypted file size in bytes.
    pub file_size: u64,
}

/// Runs the inspect command.
pub fn run(server: &Server, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut result = InspectResult {
        root: server.root().display().to_string(),
        database_count: 0,
        total_size: 0,
        databases: Vec::new(),
    };

    for db_name in server.list_databases() {
        let db = server.database(&db_name)?;
        let mut tables = Vec::new();
        for table_name in db.list_tables() {
            let table = db.table(&table_name)?;
            let path = db.dir().join(format!("{table_name}.{TABLE_EXT}"));
            let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            result.total_size += file_size;
            tables.push(TableStats {
                name: table_name,
                primary_key: table.primary_key().to_string(),
                record_count: table.count()?,
                file_size,
            });
        }
        result.databases.push(DatabaseStats {
            name: db_name,
            tables,
        });
    }
    result.database_count = result.databases.len();

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("RecDB Store Inspection");
    println!("======================");
    println!();
    println!("Root: {}", result.root);
    println!("Databases: {}", result.database_count);
    println!("Total size: {}", format_size(result.total_size));

    for db in &result.databases {
        println!();
        println!("Database '{}':", db.name);
        for table in &db.tables {
            println!(
                "  {} (key '{}'): {} record(s), {}",
                table.name,
                table.primary_key,
                table.record_count,
                format_size(table.file_size)
            );
        }
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
