//! ADO-style commands, multi-result readers and transactions over an embedded, SPI-shaped
//! query executor.
//!
//! The executor is reached through the [`SpiBackend`](spi::SpiBackend) trait: it prepares and
//! runs statements, hands back opaque tuple-table handles and reports failures as structured
//! error records. On top of it this crate provides:
//!
//! - [`Command`](command::Command) and [`Batch`](command::Batch), which split text into
//!   statements, bind parameters and dispatch each statement;
//! - [`DataReader`](reader::DataReader), a forward-only cursor over the resulting tuple tables
//!   with typed column access;
//! - a process-wide [`TypeRegistry`](catalog::TypeRegistry) that maps type OIDs to SQL names,
//!   loaded from the engine's catalog on first use;
//! - [`DatabaseError`](diagnostics::DatabaseError), a field-for-field copy of the engine's
//!   error record.
//!
//! ```rust
//! use spi_bridge::prelude::*;
//! use spi_bridge::test_utils::FakeSpi;
//!
//! let mut conn = Connection::new(FakeSpi::new());
//! conn.open()?;
//! let mut reader = Command::new("SELECT 1").execute_reader(&mut conn)?;
//! assert!(reader.next_result()?);
//! assert!(reader.read()?);
//! assert_eq!(reader.get_field_value::<i32>(0)?, 1);
//! assert!(!reader.read()?);
//! assert!(!reader.next_result()?);
//! # Ok::<(), SpiBridgeError>(())
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod params;
pub mod prelude;
pub mod reader;
pub mod results;
pub mod spi;
pub mod traits;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::SpiBridgeError;
