use thiserror::Error;

use crate::diagnostics::DatabaseError;
use crate::types::Oid;

#[derive(Debug, Error)]
pub enum SpiBridgeError {
    /// The native layer rejected a prepare, execute, commit or rollback call.
    #[error(transparent)]
    Execution(#[from] Box<DatabaseError>),

    #[error("Parameter binding error: {0}")]
    ParameterBinding(String),

    #[error("Invalid cast: {0}")]
    Cast(String),

    #[error("Invalid operation: {0}")]
    State(String),

    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("Type with OID {0} is not present in the type registry")]
    TypeNotFound(Oid),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<DatabaseError> for SpiBridgeError {
    fn from(err: DatabaseError) -> Self {
        SpiBridgeError::Execution(Box::new(err))
    }
}

impl SpiBridgeError {
    /// The translated native error, when this failure came from the engine.
    #[must_use]
    pub fn database_error(&self) -> Option<&DatabaseError> {
        match self {
            SpiBridgeError::Execution(err) => Some(err),
            _ => None,
        }
    }
}
