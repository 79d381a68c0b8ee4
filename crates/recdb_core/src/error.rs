//! Error types for RecDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in RecDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// CBOR codec error (serialize or deserialize failure).
    #[error("codec error: {0}")]
    Codec(#[from] recdb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Insert with a primary-key value that already exists.
    #[error("record with key {key} already exists")]
    DuplicateKey {
        /// The conflicting primary-key value.
        key: String,
    },

    /// Update or delete on a primary-key value that does not exist.
    #[error("record with key {key} not found")]
    RecordNotFound {
        /// The missing primary-key value.
        key: String,
    },

    /// Insert of a record without the table's primary-key field.
    #[error("record is missing primary-key field {field}")]
    MissingPrimaryKey {
        /// The table's primary-key field name.
        field: String,
    },

    /// Field value is not a supported scalar kind.
    #[error("unsupported value for field {field}: expected string, number, or boolean")]
    UnsupportedValue {
        /// The offending field name.
        field: String,
    },

    /// Table not found in the database.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the table.
        name: String,
    },

    /// Table already exists in the database.
    #[error("table already exists: {name}")]
    TableExists {
        /// Name of the table.
        name: String,
    },

    /// Database not found on the server.
    #[error("database not found: {name}")]
    DatabaseNotFound {
        /// Name of the database.
        name: String,
    },

    /// Database already exists on the server.
    #[error("database already exists: {name}")]
    DatabaseExists {
        /// Name of the database.
        name: String,
    },

    /// Server root is locked by another process.
    #[error("server locked: another process has exclusive access")]
    ServerLocked,

    /// Invalid on-disk layout or manifest contents.
    #[error("invalid format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Transaction used after reaching a terminal state.
    #[error("invalid transaction state: {message}")]
    InvalidTransactionState {
        /// Description of the misuse.
        message: String,
    },

    /// Encryption failed.
    #[error("encryption failed: {message}")]
    EncryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Decryption failed (wrong key, corrupt or truncated ciphertext).
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Invalid encryption key size.
    #[error("invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },

    /// Key derivation failed.
    #[error("key derivation failed: {message}")]
    KeyDerivationFailed {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a duplicate key error.
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Creates a record not found error.
    pub fn record_not_found(key: impl Into<String>) -> Self {
        Self::RecordNotFound { key: key.into() }
    }

    /// Creates a missing primary key error.
    pub fn missing_primary_key(field: impl Into<String>) -> Self {
        Self::MissingPrimaryKey {
            field: field.into(),
        }
    }

    /// Creates an unsupported value error.
    pub fn unsupported_value(field: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            field: field.into(),
        }
    }

    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Creates a table exists error.
    pub fn table_exists(name: impl Into<String>) -> Self {
        Self::TableExists { name: name.into() }
    }

    /// Creates a database not found error.
    pub fn database_not_found(name: impl Into<String>) -> Self {
        Self::DatabaseNotFound { name: name.into() }
    }

    /// Creates a database exists error.
    pub fn database_exists(name: impl Into<String>) -> Self {
        Self::DatabaseExists { name: name.into() }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid transaction state error.
    pub fn invalid_transaction_state(message: impl Into<String>) -> Self {
        Self::InvalidTransactionState {
            message: message.into(),
        }
    }

    /// Creates an encryption failed error.
    pub fn encryption_failed(message: impl Into<String>) -> Self {
        Self::EncryptionFailed {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid key size error.
    pub fn invalid_key_size(actual: usize, expected: usize) -> Self {
        Self::InvalidKeySize { expected, actual }
    }

    /// Creates a key derivation failed error.
    pub fn key_derivation_failed(message: impl Into<String>) -> Self {
        Self::KeyDerivationFailed {
            message: message.into(),
        }
    }
}
