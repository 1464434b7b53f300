//! Error types for the RowVault engine.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in RowVault operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database or secret that is being created already exists.
    #[error("already exists: {name}")]
    AlreadyExists {
        /// Name of the existing database or key file.
        name: String,
    },

    /// A database, table, or secret that was referenced does not exist.
    #[error("not found: {name}")]
    NotFound {
        /// Name of the missing database, table, or key file.
        name: String,
    },

    /// A row operation was attempted without holding the active connection.
    #[error("process {pid} is not the active connection for '{database}'")]
    NotConnected {
        /// The database the operation targeted.
        database: String,
        /// The process that attempted the operation.
        pid: u32,
    },

    /// A process tried to connect while already holding or awaiting a slot.
    #[error("process {pid} already holds or awaits a connection to '{database}'")]
    AlreadyConnected {
        /// The database the connect targeted.
        database: String,
        /// The process that attempted the connect.
        pid: u32,
    },

    /// A database cannot be deleted while a connection is active.
    #[error("database '{name}' has an active connection")]
    HasActiveConnections {
        /// Name of the database.
        name: String,
    },

    /// A stored line failed hex decoding, decryption, unpadding, or JSON parsing.
    #[error("corrupt record: {message}")]
    CorruptRecord {
        /// Description of the corruption.
        message: String,
    },

    /// A row does not conform to its declared schema.
    #[error("schema violation: {message}")]
    SchemaViolation {
        /// Description of the violation.
        message: String,
    },

    /// Key derivation or secret encryption failed.
    #[error("crypto failure: {message}")]
    Crypto {
        /// Description of the failure.
        message: String,
    },

    /// A database or table name is not usable as a path component.
    #[error("invalid name: {name:?}")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Row serialization failed.
    #[error("row serialization failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates an already-exists error.
    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    /// Creates a not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a corrupt-record error.
    pub fn corrupt_record(message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            message: message.into(),
        }
    }

    /// Creates a schema-violation error.
    pub fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            message: message.into(),
        }
    }

    /// Creates a crypto-failure error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Creates an invalid-name error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName { name: name.into() }
    }
}
