//! Database lifecycle and connections.

use crate::admission::AdmissionQueue;
use crate::audit::{AuditLog, AuditOutcome};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::keyvault::{KeyVault, RowKey};
use crate::layout::{validate_name, StoreLayout};
use crate::table::Table;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// The main record-store handle.
///
/// `DatabaseEngine` owns the directory tree under the configured root, the
/// key vault for per-database secrets, the store-wide audit log, and one
/// admission queue per database.
///
/// # Example
///
/// ```rust,ignore
/// use rowvault_core::{Config, DatabaseEngine};
///
/// let engine = DatabaseEngine::open(Config::new("store", "passphrase"))?;
/// engine.create_database("shop")?;
///
/// let conn = engine.connect("shop")?;
/// let orders = conn.table("Order")?;
/// orders.insert(&row)?;
/// conn.disconnect()?;
/// ```
pub struct DatabaseEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    /// Path schema under the store root.
    layout: StoreLayout,
    /// Per-database secret lifecycle.
    vault: KeyVault,
    /// Store-wide lifecycle audit log.
    global_log: AuditLog,
    /// Poll interval handed to new admission queues.
    poll_interval: Duration,
    /// Admission queues, one per known database.
    queues: Mutex<HashMap<String, Arc<AdmissionQueue>>>,
}

impl DatabaseEngine {
    /// Opens the store rooted at `config.root`, creating the directory
    /// skeleton and the store-wide audit log if absent.
    pub fn open(config: Config) -> StoreResult<Self> {
        let layout = StoreLayout::new(&config.root);
        fs::create_dir_all(layout.databases_dir())?;
        fs::create_dir_all(layout.global_dir())?;

        let global_log = AuditLog::open(&layout.global_log())?;
        let vault = KeyVault::new(config.passphrase(), config.kdf_iterations);

        info!(root = %layout.root().display(), "record store opened");
        Ok(Self {
            inner: Arc::new(EngineInner {
                layout,
                vault,
                global_log,
                poll_interval: config.poll_interval,
                queues: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Creates a database: its directory, encrypted secret, lifecycle log,
    /// and an empty admission queue.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] if the database directory is
    /// already present. Both outcomes are recorded in the audit log.
    pub fn create_database(&self, name: &str) -> StoreResult<()> {
        validate_name(name)?;
        let inner = &self.inner;

        let dir = inner.layout.database_dir(name);
        if dir.exists() {
            let err = StoreError::already_exists(name);
            inner
                .global_log
                .record(AuditOutcome::Error, "create_database", &format!("{name}: {err}"))?;
            return Err(err);
        }

        fs::create_dir_all(&dir)?;
        inner.vault.create_secret(&inner.layout.key_file(name))?;

        let db_log = AuditLog::open(&inner.layout.database_log(name))?;
        db_log.record(AuditOutcome::Success, "create_database", name)?;

        inner.queues.lock().insert(
            name.to_string(),
            Arc::new(AdmissionQueue::new(name, inner.poll_interval)),
        );
        inner
            .global_log
            .record(AuditOutcome::Success, "create_database", name)?;
        info!(database = name, "database created");
        Ok(())
    }

    /// Deletes a database and everything under its directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the database does not exist and
    /// [`StoreError::HasActiveConnections`] while a connection is active.
    /// Both failure outcomes are recorded in the audit log.
    pub fn delete_database(&self, name: &str) -> StoreResult<()> {
        validate_name(name)?;
        let inner = &self.inner;

        let dir = inner.layout.database_dir(name);
        if !dir.exists() {
            let err = StoreError::not_found(name);
            inner
                .global_log
                .record(AuditOutcome::Error, "delete_database", &format!("{name}: {err}"))?;
            return Err(err);
        }

        let active = inner
            .queues
            .lock()
            .get(name)
            .is_some_and(|queue| queue.has_active());
        if active {
            let err = StoreError::HasActiveConnections {
                name: name.to_string(),
            };
            inner
                .global_log
                .record(AuditOutcome::Error, "delete_database", &format!("{name}: {err}"))?;
            return Err(err);
        }

        // The key file is write-protected; restore write permission so the
        // removal succeeds on every platform.
        let key_file = inner.layout.key_file(name);
        if key_file.exists() {
            let mut permissions = fs::metadata(&key_file)?.permissions();
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            fs::set_permissions(&key_file, permissions)?;
        }
        fs::remove_dir_all(&dir)?;

        inner.queues.lock().remove(name);
        inner
            .global_log
            .record(AuditOutcome::Success, "delete_database", name)?;
        info!(database = name, "database deleted");
        Ok(())
    }

    /// Lists the existing databases in name order.
    pub fn databases(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.inner.layout.databases_dir())? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Connects the current process to a database.
    ///
    /// Blocks until every earlier caller in the database's FIFO queue has
    /// disconnected. See [`AdmissionQueue::connect`] for the wait contract.
    pub fn connect(&self, database: &str) -> StoreResult<Connection> {
        self.connect_as(database, std::process::id())
    }

    /// Connects with an explicit process id.
    ///
    /// Cooperating processes normally pass their own id via [`connect`];
    /// this variant exists so tests and supervisors can drive the queue for
    /// several identities from one process.
    ///
    /// [`connect`]: DatabaseEngine::connect
    pub fn connect_as(&self, database: &str, pid: u32) -> StoreResult<Connection> {
        validate_name(database)?;
        if !self.inner.layout.database_dir(database).exists() {
            return Err(StoreError::not_found(database));
        }

        let queue = self.queue(database);
        debug!(database, pid, "awaiting admission");
        queue.connect(pid)?;

        let db_log = AuditLog::open(&self.inner.layout.database_log(database))?;
        db_log.record(AuditOutcome::Success, "connect", &format!("pid {pid}"))?;

        Ok(Connection {
            inner: Arc::clone(&self.inner),
            queue,
            database: database.to_string(),
            pid,
        })
    }

    /// Returns how many processes hold or await a connection to `database`.
    #[must_use]
    pub fn queued_connections(&self, database: &str) -> usize {
        self.inner
            .queues
            .lock()
            .get(database)
            .map_or(0, |queue| queue.len())
    }

    /// Returns the admission queue for a database, creating it on first use
    /// after an engine restart.
    fn queue(&self, database: &str) -> Arc<AdmissionQueue> {
        let mut queues = self.inner.queues.lock();
        Arc::clone(queues.entry(database.to_string()).or_insert_with(|| {
            Arc::new(AdmissionQueue::new(database, self.inner.poll_interval))
        }))
    }
}

impl std::fmt::Debug for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEngine")
            .field("root", &self.inner.layout.root())
            .finish()
    }
}

/// An admitted connection to one database.
///
/// The connection is the capability for row operations: table handles are
/// constructed from it via [`Connection::table`], and every operation on
/// those handles re-checks that the connection is still the active one.
/// Dropping a connection without calling [`Connection::disconnect`] leaves
/// the admission slot held, exactly as a crashed process would.
#[derive(Debug)]
pub struct Connection {
    inner: Arc<EngineInner>,
    queue: Arc<AdmissionQueue>,
    database: String,
    pid: u32,
}

impl Connection {
    /// Returns the database this connection belongs to.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the owning process id.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns true iff this connection is the active one.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.queue.is_connected(self.pid)
    }

    /// Opens a handle to the named table within this database.
    ///
    /// The table file itself is created lazily on first insert.
    pub fn table(&self, name: &str) -> StoreResult<Table<'_>> {
        validate_name(name)?;
        Ok(Table::new(self, name))
    }

    /// Releases the admission slot, promoting the next waiter.
    ///
    /// The handle stays around after disconnecting, but every subsequent
    /// row operation through it fails with [`StoreError::NotConnected`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConnected`] if this connection is not the
    /// active one (disconnecting twice included).
    pub fn disconnect(&self) -> StoreResult<()> {
        self.queue.disconnect(self.pid)?;
        let db_log = AuditLog::open(&self.inner.layout.database_log(&self.database))?;
        db_log.record(AuditOutcome::Success, "disconnect", &format!("pid {}", self.pid))?;
        Ok(())
    }

    /// Fails unless this connection is the active one.
    pub(crate) fn ensure_active(&self) -> StoreResult<()> {
        if !self.is_connected() {
            return Err(StoreError::NotConnected {
                database: self.database.clone(),
                pid: self.pid,
            });
        }
        Ok(())
    }

    /// Derives the row key for this connection's database.
    pub(crate) fn row_key(&self) -> StoreResult<RowKey> {
        self.inner
            .vault
            .row_key(&self.inner.layout.key_file(&self.database))
    }

    /// Returns the table-file path for a table of this database.
    pub(crate) fn table_path(&self, table: &str) -> PathBuf {
        self.inner.layout.table_file(&self.database, table)
    }
}
