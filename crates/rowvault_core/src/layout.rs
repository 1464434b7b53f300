//! Store directory layout.
//!
//! File system layout under the configured root:
//!
//! ```text
//! <root>/
//! ├─ global/
//! │  └─ global.log              # store-wide lifecycle audit log
//! └─ databases/
//!    └─ <name>/
//!       ├─ <name>.log           # per-database lifecycle audit log
//!       ├─ database.key         # salt ‖ iv ‖ encrypted database secret
//!       └─ <Table>.table        # one hex-encoded encrypted line per row
//! ```

use crate::error::{StoreError, StoreResult};
use std::path::{Path, PathBuf};

const GLOBAL_DIR: &str = "global";
const DATABASES_DIR: &str = "databases";
const GLOBAL_LOG_FILE: &str = "global.log";
const KEY_FILE: &str = "database.key";
const TABLE_EXT: &str = "table";
const LOG_EXT: &str = "log";

/// Resolves paths under the store root.
#[derive(Debug, Clone)]
pub(crate) struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn global_dir(&self) -> PathBuf {
        self.root.join(GLOBAL_DIR)
    }

    pub(crate) fn global_log(&self) -> PathBuf {
        self.global_dir().join(GLOBAL_LOG_FILE)
    }

    pub(crate) fn databases_dir(&self) -> PathBuf {
        self.root.join(DATABASES_DIR)
    }

    pub(crate) fn database_dir(&self, database: &str) -> PathBuf {
        self.databases_dir().join(database)
    }

    pub(crate) fn database_log(&self, database: &str) -> PathBuf {
        self.database_dir(database)
            .join(format!("{database}.{LOG_EXT}"))
    }

    pub(crate) fn key_file(&self, database: &str) -> PathBuf {
        self.database_dir(database).join(KEY_FILE)
    }

    pub(crate) fn table_file(&self, database: &str, table: &str) -> PathBuf {
        self.database_dir(database).join(format!("{table}.{TABLE_EXT}"))
    }
}

/// Rejects names that would escape the store layout as path components.
pub(crate) fn validate_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::invalid_name(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_layout() {
        let layout = StoreLayout::new("/store");

        assert_eq!(layout.global_log(), PathBuf::from("/store/global/global.log"));
        assert_eq!(
            layout.database_log("shop"),
            PathBuf::from("/store/databases/shop/shop.log")
        );
        assert_eq!(
            layout.key_file("shop"),
            PathBuf::from("/store/databases/shop/database.key")
        );
        assert_eq!(
            layout.table_file("shop", "Order"),
            PathBuf::from("/store/databases/shop/Order.table")
        );
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("shop").is_ok());
        assert!(validate_name("Shop_2").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name(".").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a\\b").is_err());
    }
}
