//! CLI command implementations.

pub mod lifecycle;
pub mod rows;

use rowvault_core::{Config, DatabaseEngine};
use std::path::Path;

/// Opens the engine over the given store root.
pub fn open_engine(
    root: &Path,
    passphrase: &str,
) -> Result<DatabaseEngine, Box<dyn std::error::Error>> {
    let engine = DatabaseEngine::open(Config::new(root, passphrase))?;
    Ok(engine)
}
