//! Capability traits shared by commands, readers and transactions.

use crate::command::{Batch, Command};
use crate::connection::Connection;
use crate::error::SpiBridgeError;
use crate::reader::DataReader;
use crate::spi::SpiBackend;
use crate::transaction::Transaction;
use crate::types::RowValues;

/// Something that can run against a connection.
pub trait Executable {
    /// # Errors
    /// Returns parameter, state or execution errors.
    fn execute_reader<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
    ) -> Result<DataReader<'c, B>, SpiBridgeError>;

    /// # Errors
    /// Returns parameter, state or execution errors.
    fn execute_scalar<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<Option<RowValues>, SpiBridgeError>;

    /// # Errors
    /// Returns parameter, state or execution errors.
    fn execute_non_query<B: SpiBackend>(&self, conn: &mut Connection<B>) -> Result<i64, SpiBridgeError>;
}

impl Executable for Command {
    fn execute_reader<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
    ) -> Result<DataReader<'c, B>, SpiBridgeError> {
        Command::execute_reader(self, conn)
    }

    fn execute_scalar<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<Option<RowValues>, SpiBridgeError> {
        Command::execute_scalar(self, conn)
    }

    fn execute_non_query<B: SpiBackend>(&self, conn: &mut Connection<B>) -> Result<i64, SpiBridgeError> {
        Command::execute_non_query(self, conn)
    }
}

impl Executable for Batch {
    fn execute_reader<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
    ) -> Result<DataReader<'c, B>, SpiBridgeError> {
        Batch::execute_reader(self, conn)
    }

    fn execute_scalar<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<Option<RowValues>, SpiBridgeError> {
        Batch::execute_scalar(self, conn)
    }

    fn execute_non_query<B: SpiBackend>(&self, conn: &mut Connection<B>) -> Result<i64, SpiBridgeError> {
        Batch::execute_non_query(self, conn)
    }
}

/// Forward-only access to result sets and rows.
pub trait RowCursor {
    /// # Errors
    /// Returns fetch errors; the cursor is consumed afterwards.
    fn next_result(&mut self) -> Result<bool, SpiBridgeError>;

    /// # Errors
    /// Returns fetch errors; the cursor is consumed afterwards.
    fn read(&mut self) -> Result<bool, SpiBridgeError>;

    fn field_count(&self) -> usize;

    /// # Errors
    /// Returns state, range or codec errors.
    fn get_value(&self, ordinal: usize) -> Result<RowValues, SpiBridgeError>;

    /// # Errors
    /// Returns state or range errors.
    fn is_db_null(&self, ordinal: usize) -> Result<bool, SpiBridgeError>;

    fn close(&mut self);
}

impl<B: SpiBackend> RowCursor for DataReader<'_, B> {
    fn next_result(&mut self) -> Result<bool, SpiBridgeError> {
        DataReader::next_result(self)
    }

    fn read(&mut self) -> Result<bool, SpiBridgeError> {
        DataReader::read(self)
    }

    fn field_count(&self) -> usize {
        DataReader::field_count(self)
    }

    fn get_value(&self, ordinal: usize) -> Result<RowValues, SpiBridgeError> {
        DataReader::get_value(self, ordinal)
    }

    fn is_db_null(&self, ordinal: usize) -> Result<bool, SpiBridgeError> {
        DataReader::is_db_null(self, ordinal)
    }

    fn close(&mut self) {
        DataReader::close(self);
    }
}

/// Transaction control.
pub trait Transactional: Sized {
    /// # Errors
    /// Returns the native commit failure.
    fn commit(self) -> Result<(), SpiBridgeError>;

    /// # Errors
    /// Returns the native rollback failure.
    fn rollback(self) -> Result<(), SpiBridgeError>;

    /// # Errors
    /// Returns argument or execution errors.
    fn save(&mut self, name: &str) -> Result<(), SpiBridgeError>;

    /// # Errors
    /// Returns argument or execution errors.
    fn release(&mut self, name: &str) -> Result<(), SpiBridgeError>;

    /// # Errors
    /// Returns argument or execution errors.
    fn rollback_to(&mut self, name: &str) -> Result<(), SpiBridgeError>;
}

impl<B: SpiBackend> Transactional for Transaction<'_, B> {
    fn commit(self) -> Result<(), SpiBridgeError> {
        Transaction::commit(self)
    }

    fn rollback(self) -> Result<(), SpiBridgeError> {
        Transaction::rollback(self)
    }

    fn save(&mut self, name: &str) -> Result<(), SpiBridgeError> {
        Transaction::save(self, name)
    }

    fn release(&mut self, name: &str) -> Result<(), SpiBridgeError> {
        Transaction::release(self, name)
    }

    fn rollback_to(&mut self, name: &str) -> Result<(), SpiBridgeError> {
        Transaction::rollback_to(self, name)
    }
}
