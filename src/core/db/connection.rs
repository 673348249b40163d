/// Connection Management Module
///
/// This module provides the connection lifecycle wrapper at the heart of
/// pumpdb: lazy connection establishment, pass-through statement execution,
/// and commit-on-close teardown.

use crate::core::{PumpDbError, Result};
use rusqlite::{Connection, Params};
use std::collections::HashMap;

/// Manages the lifecycle of a single SQLite connection.
///
/// The manager is constructed disconnected and never opens the database
/// eagerly. `connect` fills the connection slot, `execute`/`execute_many`
/// forward statements to the engine, and `close` commits any open
/// transaction before releasing the connection and returning the manager to
/// the disconnected state (after which `connect` may be called again).
///
/// The settings mapping is inert pass-through state: it is supplied by an
/// external collaborator (see `store::settings::SettingsStore`) and never
/// interpreted here.
///
/// A manager owns at most one connection and has no locking discipline of
/// its own; callers needing concurrent access must create independent
/// managers or synchronize externally.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Path to the database file (or ":memory:")
    path: String,
    /// Externally supplied key/value settings, stored but not interpreted
    settings: HashMap<String, String>,
    /// Active database connection (None if disconnected)
    conn: Option<Connection>,
}

impl ConnectionManager {
    /// Creates a disconnected manager with an empty settings mapping.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_settings(path, HashMap::new())
    }

    /// Creates a disconnected manager with an externally supplied settings
    /// mapping.
    pub fn with_settings(path: impl Into<String>, settings: HashMap<String, String>) -> Self {
        ConnectionManager {
            path: path.into(),
            settings,
            conn: None,
        }
    }

    /// Creates a manager and runs a one-shot initialization hook against it
    /// before returning.
    ///
    /// The hook is an extension point for callers that need setup at
    /// construction time (schema checks, seeding); the plain constructors
    /// behave as if the hook were a no-op.
    pub fn with_init<F>(
        path: impl Into<String>,
        settings: HashMap<String, String>,
        init: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut ConnectionManager) -> Result<()>,
    {
        let mut manager = Self::with_settings(path, settings);
        init(&mut manager)?;
        Ok(manager)
    }

    /// Opens the connection to the database named at construction.
    ///
    /// The database is opened with the engine's default semantics; no
    /// pragmas are applied. Calling `connect` while already connected fails
    /// with `AlreadyConnected` and leaves the open connection untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use pumpdb::core::db::ConnectionManager;
    ///
    /// let mut link = ConnectionManager::new(":memory:");
    /// link.connect()?;
    /// link.execute("CREATE TABLE t (id INTEGER, name TEXT)", [])?;
    /// link.close()?;
    /// # Ok::<(), pumpdb::core::PumpDbError>(())
    /// ```
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Err(PumpDbError::AlreadyConnected);
        }
        self.conn = Some(Connection::open(&self.path)?);
        Ok(())
    }

    /// Commits any open transaction, releases the connection, and resets
    /// the manager to the disconnected state.
    ///
    /// Calling `close` while already disconnected is a no-op. The
    /// connection slot is emptied before teardown runs, so the manager ends
    /// up disconnected even when the commit or the release fails; the
    /// engine error still propagates to the caller.
    pub fn close(&mut self) -> Result<()> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => return Ok(()),
        };
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        conn.close().map_err(|(_, e)| PumpDbError::Database(e))
    }

    /// Forwards a single statement and its parameters to the engine.
    ///
    /// Returns the changed-row count reported by the engine. Fails with
    /// `NotConnected` when no connection is open. Statement text and
    /// parameters are passed through unmodified; result retrieval is out of
    /// scope here and available through [`connection`](Self::connection).
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let conn = self.connection()?;
        Ok(conn.execute(sql, params)?)
    }

    /// Forwards a statement once per parameter set in `param_sets`.
    ///
    /// The statement is prepared once and executed for each set. Returns
    /// the total changed-row count. Same precondition and failure mode as
    /// [`execute`](Self::execute).
    pub fn execute_many<P, I>(&self, sql: &str, param_sets: I) -> Result<usize>
    where
        P: Params,
        I: IntoIterator<Item = P>,
    {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let mut changed = 0;
        for params in param_sets {
            changed += stmt.execute(params)?;
        }
        Ok(changed)
    }

    /// Borrows the live connection for direct statement preparation and
    /// result retrieval.
    ///
    /// Fails with `NotConnected` when no connection is open.
    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(PumpDbError::NotConnected)
    }

    /// Returns `true` while a connection is open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The database path this manager was constructed with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The externally supplied settings mapping.
    pub fn settings(&self) -> &HashMap<String, String> {
        &self.settings
    }

    /// Mutable access to the settings mapping, for collaborators that load
    /// settings after construction.
    pub fn settings_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.settings
    }
}
