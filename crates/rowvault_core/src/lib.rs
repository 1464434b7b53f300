//! # RowVault Core
//!
//! A minimal single-node record store: named databases, each holding named
//! tables, each table persisted as a flat file of encrypted rows, with
//! access serialized across cooperating processes through a FIFO admission
//! queue.
//!
//! This crate provides:
//! - Database lifecycle with audited create/delete ([`DatabaseEngine`])
//! - Per-database secret management and key derivation ([`KeyVault`])
//! - Row encryption as hex AES-256-CBC lines ([`encode_row`], [`decode_row`])
//! - Insert/search/update/delete over table files ([`Table`])
//! - FIFO connection admission ([`AdmissionQueue`], [`Connection`])
//! - Optional typed-column validation ([`Schema`])
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rowvault_core::{Config, DatabaseEngine};
//! use serde_json::json;
//!
//! let engine = DatabaseEngine::open(Config::new("store", "passphrase"))?;
//! engine.create_database("shop")?;
//!
//! let conn = engine.connect("shop")?;
//! let items = conn.table("Item")?;
//! items.insert(json!({"id": 1, "name": "A"}).as_object().unwrap())?;
//! let found = items.search(json!({"id": 1}).as_object().unwrap())?;
//! conn.disconnect()?;
//! ```
//!
//! ## Security model
//!
//! Rows are encrypted with a key derived from the database's key file, and
//! the key file is itself encrypted under the engine passphrase. The layer
//! protects data from casual inspection and the key file from accidental
//! overwrite; it does not protect row data from an attacker who can read
//! the filesystem (see [`KeyVault::row_key`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod admission;
mod audit;
mod codec;
mod config;
mod engine;
mod error;
mod keyvault;
mod layout;
mod row;
mod table;

pub use admission::AdmissionQueue;
pub use audit::{AuditLog, AuditOutcome};
pub use codec::{decode_row, encode_row};
pub use config::{Config, DEFAULT_KDF_ITERATIONS, DEFAULT_POLL_INTERVAL};
pub use engine::{Connection, DatabaseEngine};
pub use error::{StoreError, StoreResult};
pub use keyvault::{KeyVault, RowKey, BLOCK_SIZE, IV_SIZE, KEY_SIZE, SALT_SIZE, SECRET_SIZE};
pub use row::{Column, ColumnKind, Row, Schema};
pub use table::Table;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
