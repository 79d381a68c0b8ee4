//! Join command implementation.

use recdb_core::{join_tables, JoinKind, Server};

/// Runs the join command.
#[allow(clippy::too_many_arguments)]
pub fn run(
    server: &Server,
    database: &str,
    table1: &str,
    table2: &str,
    on1: &str,
    on2: &str,
    kind: JoinKind,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = server.database(database)?;
    let t1 = db.table(table1)?;
    let t2 = db.table(table2)?;

    let rows = join_tables(&t1, &t2, on1, on2, kind)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        _ => {
            for row in &rows {
                let fields: Vec<String> = row
                    .iter()
                    .map(|(field, value)| format!("{field}={value}"))
                    .collect();
                println!("{}", fields.join(", "));
            }
            println!("{} row(s)", rows.len());
        }
    }
    Ok(())
}
