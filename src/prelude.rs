//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::catalog::{TypeDescriptor, TypeKind, TypeRegistry};
pub use crate::command::{Batch, BatchCommand, Command};
pub use crate::config::{ConnectionConfig, ConnectionConfigBuilder};
pub use crate::connection::{BindingScope, Connection, ConnectionState, ServerVersion};
pub use crate::diagnostics::DatabaseError;
pub use crate::error::SpiBridgeError;
pub use crate::params::Parameter;
pub use crate::reader::{DataReader, FieldDescriptor, FromSqlValue, ReaderState};
pub use crate::results::ResultBatch;
pub use crate::spi::SpiBackend;
pub use crate::traits::{Executable, RowCursor, Transactional};
pub use crate::transaction::{IsolationLevel, Transaction};
pub use crate::types::{CommandBehavior, DbType, Oid, RowValues};

pub use tokio_util::sync::CancellationToken;
