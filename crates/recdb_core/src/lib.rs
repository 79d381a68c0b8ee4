//! Embedded encrypted record store.
//!
//! `recdb_core` implements the storage engine: a server root holding
//! databases, each database a directory of tables, each table a
//! single AES-256-GCM encrypted CBOR file of records keyed by a
//! primary-key field. Every table keeps secondary in-memory indexes
//! over all of its fields, supports typed equality joins against
//! other tables, and offers an all-or-nothing transaction wrapper
//! around single mutations.
//!
//! Durability is whole-file replacement: every mutation re-encodes,
//! re-encrypts, and rewrites the table file before returning.
//!
//! ```no_run
//! use recdb_core::{Config, Record, Server};
//!
//! # fn main() -> recdb_core::CoreResult<()> {
//! let server = Server::open("/var/lib/recdb", Config::default())?;
//! let db = server.create_database("app")?;
//! let users = db.create_table("users", "id")?;
//!
//! let mut alice = Record::new();
//! alice.set("id", "u1");
//! alice.set("name", "alice");
//! users.insert(alice)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod crypto;
mod database;
mod error;
mod index;
mod join;
mod manifest;
mod server;
mod table;
mod transaction;

pub use config::{Config, KeySource};
pub use crypto::{CryptoManager, EncryptionKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use database::{validate_name, Database, TABLE_EXT};
pub use error::{CoreError, CoreResult};
pub use index::FieldIndexes;
pub use join::{join_tables, JoinKind, JoinRow};
pub use manifest::{Manifest, MANIFEST_FILE};
pub use server::{Server, KEY_FILE, LOCK_FILE, SALT_FILE};
pub use table::Table;
pub use transaction::{TableOperation, Transaction, TransactionState};

pub use recdb_codec::{FieldValue, Record, RecordSet};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
