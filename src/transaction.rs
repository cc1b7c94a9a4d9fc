use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::connection::Connection;
use crate::error::SpiBridgeError;
use crate::spi::{SpiBackend, gateway};

/// Transaction isolation levels a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Treated as `ReadCommitted`.
    #[default]
    Unspecified,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    /// Served as `REPEATABLE READ`, which is snapshot isolation in this engine.
    Snapshot,
    Serializable,
    Chaos,
}

impl IsolationLevel {
    /// SQL spelling used in `SET TRANSACTION ISOLATION LEVEL`.
    ///
    /// # Errors
    /// Returns `SpiBridgeError::UnsupportedConfiguration` for `Chaos`.
    pub fn as_sql(self) -> Result<&'static str, SpiBridgeError> {
        match self {
            IsolationLevel::Unspecified | IsolationLevel::ReadCommitted => Ok("READ COMMITTED"),
            IsolationLevel::ReadUncommitted => Ok("READ UNCOMMITTED"),
            IsolationLevel::RepeatableRead | IsolationLevel::Snapshot => Ok("REPEATABLE READ"),
            IsolationLevel::Serializable => Ok("SERIALIZABLE"),
            IsolationLevel::Chaos => Err(SpiBridgeError::UnsupportedConfiguration(format!(
                "Unsupported IsolationLevel: {self:?}"
            ))),
        }
    }

    fn effective(self) -> Self {
        match self {
            IsolationLevel::Unspecified => IsolationLevel::ReadCommitted,
            other => other,
        }
    }
}

/// Quote a savepoint name unless it is a plain lower-case identifier.
///
/// # Errors
/// Returns `InvalidArgument` for an empty or whitespace-only name.
pub fn quote_savepoint_name(name: &str) -> Result<String, SpiBridgeError> {
    if name.trim().is_empty() {
        return Err(SpiBridgeError::InvalidArgument(
            "savepoint name can't be empty".to_string(),
        ));
    }
    let plain = Regex::new(r"^[a-z_][a-z0-9_$]*$")
        .map_err(|e| SpiBridgeError::ConfigError(format!("savepoint pattern: {e}")))?;
    if plain.is_match(name) {
        Ok(name.to_string())
    } else {
        Ok(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// A transaction on a [`Connection`].
///
/// Dropping a transaction that was neither committed nor rolled back rolls it back.
pub struct Transaction<'c, B: SpiBackend> {
    conn: &'c mut Connection<B>,
    level: IsolationLevel,
    completed: bool,
}

impl<'c, B: SpiBackend> Transaction<'c, B> {
    /// The procedure already runs inside a transaction, so it is committed first and the
    /// isolation level applies to the transaction that follows.
    pub(crate) fn begin(
        conn: &'c mut Connection<B>,
        level: IsolationLevel,
    ) -> Result<Self, SpiBridgeError> {
        let level = level.effective();
        let sql_level = level.as_sql()?;

        gateway::commit(conn.backend_mut())?;
        let statement = format!("SET TRANSACTION ISOLATION LEVEL {sql_level}");
        gateway::execute(conn.backend_mut(), &statement, false, 0)?;
        debug!(?level, "transaction started");

        Ok(Self {
            conn,
            level,
            completed: false,
        })
    }

    #[must_use]
    pub fn isolation_level(&self) -> IsolationLevel {
        self.level
    }

    /// The connection, for running commands inside the transaction.
    pub fn connection(&mut self) -> &mut Connection<B> {
        &mut *self.conn
    }

    /// # Errors
    /// Returns `SpiBridgeError::Execution` if the native commit fails.
    pub fn commit(mut self) -> Result<(), SpiBridgeError> {
        self.completed = true;
        gateway::commit(self.conn.backend_mut())
    }

    /// # Errors
    /// Returns `SpiBridgeError::Execution` if the native rollback fails.
    pub fn rollback(mut self) -> Result<(), SpiBridgeError> {
        self.completed = true;
        gateway::rollback(self.conn.backend_mut())
    }

    /// Create a savepoint.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty name and `Execution` if the statement fails.
    pub fn save(&mut self, name: &str) -> Result<(), SpiBridgeError> {
        let quoted = quote_savepoint_name(name)?;
        debug!(savepoint = %quoted, "creating savepoint");
        self.run(&format!("SAVEPOINT {quoted}"))
    }

    /// Release a savepoint.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty name and `Execution` if the statement fails.
    pub fn release(&mut self, name: &str) -> Result<(), SpiBridgeError> {
        let quoted = quote_savepoint_name(name)?;
        self.run(&format!("RELEASE SAVEPOINT {quoted}"))
    }

    /// Roll back to a savepoint.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for an empty name and `Execution` if the statement fails.
    pub fn rollback_to(&mut self, name: &str) -> Result<(), SpiBridgeError> {
        let quoted = quote_savepoint_name(name)?;
        self.run(&format!("ROLLBACK TO SAVEPOINT {quoted}"))
    }

    /// # Errors
    /// See [`commit`](Self::commit). The token is accepted and not observed.
    pub async fn commit_async(self, _cancel: &CancellationToken) -> Result<(), SpiBridgeError> {
        self.commit()
    }

    /// # Errors
    /// See [`rollback`](Self::rollback). The token is accepted and not observed.
    pub async fn rollback_async(self, _cancel: &CancellationToken) -> Result<(), SpiBridgeError> {
        self.rollback()
    }

    fn run(&mut self, statement: &str) -> Result<(), SpiBridgeError> {
        gateway::execute(self.conn.backend_mut(), statement, false, 0).map(|_| ())
    }
}

impl<B: SpiBackend> Drop for Transaction<'_, B> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if let Err(err) = gateway::rollback(self.conn.backend_mut()) {
            warn!(error = %err, "rollback of abandoned transaction failed");
        }
    }
}
