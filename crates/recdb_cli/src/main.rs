//! RecDB CLI
//!
//! Command-line tools for encrypted record stores.
//!
//! # Commands
//!
//! - `create-db` - Create a database
//! - `create-table` - Create a table with a primary-key field
//! - `insert` - Insert a record from JSON
//! - `select` - Fetch one record or dump a table
//! - `update` - Update fields of a record from JSON
//! - `delete` - Delete a record
//! - `join` - Join two tables on a field pair
//! - `inspect` - Display store statistics

mod commands;

use clap::{Parser, Subcommand};
use recdb_core::JoinKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// RecDB command-line record store tools.
#[derive(Parser)]
#[command(name = "recdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the server root directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Derive the encryption key from this passphrase instead of the
    /// root KEY file
    #[arg(global = true, long)]
    passphrase: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a database
    CreateDb {
        /// Database name
        database: String,
    },

    /// Create a table keyed by a primary-key field
    CreateTable {
        /// Database name
        database: String,
        /// Table name
        table: String,
        /// Primary-key field
        #[arg(short = 'k', long, default_value = "id")]
        primary_key: String,
    },

    /// Insert a record given as a JSON object of scalar fields
    Insert {
        /// Database name
        database: String,
        /// Table name
        table: String,
        /// Record as JSON, e.g. '{"id":"u1","age":30}'
        record: String,
    },

    /// Fetch one record by key, or dump the whole table
    Select {
        /// Database name
        database: String,
        /// Table name
        table: String,
        /// Primary-key value; omit to dump the table
        key: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Update fields of a record from a JSON object
    Update {
        /// Database name
        database: String,
        /// Table name
        table: String,
        /// Primary-key value
        key: String,
        /// Field updates as JSON, e.g. '{"age":31}'
        updates: String,
    },

    /// Delete a record by key
    Delete {
        /// Database name
        database: String,
        /// Table name
        table: String,
        /// Primary-key value
        key: String,
    },

    /// Join two tables on a field pair
    Join {
        /// Database name
        database: String,
        /// First table
        table1: String,
        /// Second table
        table2: String,

        /// Join field of the first table
        #[arg(long)]
        on1: String,

        /// Join field of the second table (defaults to --on1)
        #[arg(long)]
        on2: Option<String>,

        /// Join kind (inner, left, right, full)
        #[arg(short, long, default_value = "inner")]
        kind: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Display store statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn parse_join_kind(kind: &str) -> Result<JoinKind, String> {
    match kind {
        "inner" => Ok(JoinKind::Inner),
        "left" => Ok(JoinKind::Left),
        "right" => Ok(JoinKind::Right),
        "full" => Ok(JoinKind::FullOuter),
        other => Err(format!(
            "unknown join kind {other:?} (expected inner, left, right or full)"
        )),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let root = cli.path.ok_or("Server root path required (--path)")?;
    let server = commands::open_server(&root, cli.passphrase)?;

    match cli.command {
        Commands::CreateDb { database } => {
            commands::create_db::run(&server, &database)?;
        }
        Commands::CreateTable {
            database,
            table,
            primary_key,
        } => {
            commands::create_table::run(&server, &database, &table, &primary_key)?;
        }
        Commands::Insert {
            database,
            table,
            record,
        } => {
            commands::insert::run(&server, &database, &table, &record)?;
        }
        Commands::Select {
            database,
            table,
            key,
            format,
        } => {
            commands::select::run(&server, &database, &table, key.as_deref(), &format)?;
        }
        Commands::Update {
            database,
            table,
            key,
            updates,
        } => {
            commands::update::run(&server, &database, &table, &key, &updates)?;
        }
        Commands::Delete {
            database,
            table,
            key,
        } => {
            commands::delete::run(&server, &database, &table, &key)?;
        }
        Commands::Join {
            database,
            table1,
            table2,
            on1,
            on2,
            kind,
            format,
        } => {
            let kind = parse_join_kind(&kind)?;
            let on2 = on2.as_deref().unwrap_or(&on1);
            commands::join::run(&server, &database, &table1, &table2, &on1, on2, kind, &format)?;
        }
        Commands::Inspect { format } => {
            commands::inspect::run(&server, &format)?;
        }
        Commands::Version => {
            println!("RecDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("RecDB Core v{}", recdb_core::VERSION);
        }
    }

    Ok(())
}
