use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tokio::sync::Notify;
use tracing::debug;

use crate::catalog::TypeRegistry;
use crate::command::Command;
use crate::config::ConnectionConfig;
use crate::error::SpiBridgeError;
use crate::spi::SpiBackend;
use crate::transaction::{IsolationLevel, Transaction};

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Open,
    /// A command is dispatching statements.
    Executing,
    /// A reader is walking results.
    Fetching,
}

/// Who holds the native session binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingScope {
    None,
    /// Bound when the connection opened, for the connection's lifetime.
    Connection,
    /// Bound by the reader currently open on the connection.
    Reader,
}

/// Engine version reported by the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{patch}", self.major, self.minor),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Parse a version string such as `16.2`, `9.6.24` or `PostgreSQL 17beta1`.
///
/// # Errors
/// Returns `SpiBridgeError::ConfigError` when no version number can be found.
pub fn parse_server_version(raw: &str) -> Result<ServerVersion, SpiBridgeError> {
    let pattern = Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?")
        .map_err(|e| SpiBridgeError::ConfigError(format!("version pattern: {e}")))?;
    let caps = pattern.captures(raw).ok_or_else(|| {
        SpiBridgeError::ConfigError(format!("Unable to parse server version '{raw}'"))
    })?;

    let part = |idx: usize| -> Result<Option<u32>, SpiBridgeError> {
        caps.get(idx)
            .map(|m| {
                m.as_str().parse::<u32>().map_err(|e| {
                    SpiBridgeError::ConfigError(format!("Invalid server version '{raw}': {e}"))
                })
            })
            .transpose()
    };

    Ok(ServerVersion {
        major: part(1)?.unwrap_or_default(),
        minor: part(2)?.unwrap_or_default(),
        patch: part(3)?,
    })
}

/// A session on the embedded executor.
///
/// The connection owns the native backend. Readers and transactions borrow it mutably, so only
/// one statement is ever in flight and no native handle outlives the borrow that produced it.
pub struct Connection<B: SpiBackend> {
    backend: B,
    config: ConnectionConfig,
    state: ConnectionState,
    binding: BindingScope,
    reader_completion: Arc<Notify>,
}

impl<B: SpiBackend> fmt::Debug for Connection<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("binding", &self.binding)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B: SpiBackend> Connection<B> {
    /// Create a closed connection over `backend` with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, ConnectionConfig::default())
    }

    pub fn with_config(backend: B, config: ConnectionConfig) -> Self {
        Self {
            backend,
            config,
            state: ConnectionState::Closed,
            binding: BindingScope::None,
            reader_completion: Arc::new(Notify::new()),
        }
    }

    /// Open the connection. The session already exists, so this only moves the state.
    ///
    /// # Errors
    /// Returns `SpiBridgeError::State` if the connection is not closed.
    pub fn open(&mut self) -> Result<(), SpiBridgeError> {
        if self.state != ConnectionState::Closed {
            return Err(SpiBridgeError::State(format!(
                "Connection already open (state {:?})",
                self.state
            )));
        }
        self.state = ConnectionState::Open;
        if self.config.bind_on_open {
            self.binding = BindingScope::Connection;
        }
        debug!(binding = ?self.binding, "connection opened");
        Ok(())
    }

    /// Close the connection. Closing a closed connection does nothing.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        self.binding = BindingScope::None;
        debug!("connection closed");
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state != ConnectionState::Closed
    }

    #[must_use]
    pub fn binding_scope(&self) -> BindingScope {
        self.binding
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.config.type_registry
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Notifier signalled each time a reader on this connection closes.
    #[must_use]
    pub fn reader_completion(&self) -> Arc<Notify> {
        Arc::clone(&self.reader_completion)
    }

    /// Engine version, parsed from the string the native layer reports.
    ///
    /// # Errors
    /// Returns `SpiBridgeError::ConfigError` if the version string cannot be parsed.
    pub fn server_version(&self) -> Result<ServerVersion, SpiBridgeError> {
        parse_server_version(&self.backend.engine_version())
    }

    /// Create a command with the given text.
    #[must_use]
    pub fn create_command(&self, text: impl Into<String>) -> Command {
        Command::new(text)
    }

    /// Begin a transaction at the requested isolation level.
    ///
    /// # Errors
    /// Returns `State` on a closed connection, `UnsupportedConfiguration` for an isolation level
    /// the engine cannot honor, and `Execution` if the native commit or `SET TRANSACTION` fails.
    pub fn begin_transaction(
        &mut self,
        level: IsolationLevel,
    ) -> Result<Transaction<'_, B>, SpiBridgeError> {
        self.check_ready()?;
        Transaction::begin(self, level)
    }

    pub(crate) fn check_ready(&self) -> Result<(), SpiBridgeError> {
        match self.state {
            ConnectionState::Open => Ok(()),
            ConnectionState::Closed => Err(SpiBridgeError::State(
                "Connection is not open".to_string(),
            )),
            other => Err(SpiBridgeError::State(format!(
                "Connection is busy (state {other:?})"
            ))),
        }
    }

    /// Move into `Executing`, binding the session to the upcoming reader when nothing holds it.
    /// Returns whether the reader owns the binding.
    pub(crate) fn begin_execution(&mut self) -> Result<bool, SpiBridgeError> {
        self.check_ready()?;
        self.state = ConnectionState::Executing;
        if self.binding == BindingScope::None {
            self.binding = BindingScope::Reader;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn start_fetching(&mut self) {
        if self.state == ConnectionState::Executing {
            self.state = ConnectionState::Fetching;
        }
    }

    /// Undo `begin_execution` after a failed dispatch.
    pub(crate) fn abort_execution(&mut self, owns_binding: bool) {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Open;
        }
        if owns_binding && self.binding == BindingScope::Reader {
            self.binding = BindingScope::None;
        }
    }

    /// Bookkeeping for the first close of a reader.
    pub(crate) fn finish_reader(&mut self, owns_binding: bool, close_connection: bool) {
        if self.state != ConnectionState::Closed {
            self.state = ConnectionState::Open;
        }
        if owns_binding && self.binding == BindingScope::Reader {
            self.binding = BindingScope::None;
        }
        if close_connection {
            self.close();
        }
        self.reader_completion.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_version_shapes() {
        assert_eq!(
            parse_server_version("16.2").unwrap(),
            ServerVersion {
                major: 16,
                minor: 2,
                patch: None
            }
        );
        assert_eq!(
            parse_server_version("9.6.24").unwrap().to_string(),
            "9.6.24"
        );
        assert_eq!(parse_server_version("17beta1").unwrap().major, 17);
        assert!(matches!(
            parse_server_version("devel"),
            Err(SpiBridgeError::ConfigError(_))
        ));
    }
}
