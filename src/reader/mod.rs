//! Forward-only cursor over the tuple tables of one executed command.

mod access;
mod field;

pub use access::FromSqlValue;
pub use field::FieldDescriptor;

use std::sync::Arc;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::Connection;
use crate::error::SpiBridgeError;
use crate::results::ResultBatch;
use crate::spi::{Datum, SpiBackend, StatementOutcome};
use crate::types::{CommandBehavior, Oid, RowValues};

/// Position of a [`DataReader`] in its batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// A result is current and its first row, if any, is already fetched.
    BeforeResult,
    InResult,
    /// No result is current yet.
    BetweenResults,
    Consumed,
    Closed,
    Disposed,
}

/// Cursor over the results of an executed command.
///
/// Call [`next_result`](Self::next_result) to move to the first result, then
/// [`read`](Self::read) to walk its rows. The reader borrows the connection for its whole
/// lifetime; dropping it disposes it.
pub struct DataReader<'c, B: SpiBackend> {
    conn: &'c mut Connection<B>,
    batch: ResultBatch,
    behavior: CommandBehavior,
    state: ReaderState,
    result_index: Option<usize>,
    row_index: u64,
    row_pending: bool,
    on_row: bool,
    fields: Vec<FieldDescriptor>,
    datums: Vec<Datum>,
    nulls: Vec<bool>,
    owns_binding: bool,
}

impl<'c, B: SpiBackend> DataReader<'c, B> {
    pub(crate) fn new(
        conn: &'c mut Connection<B>,
        batch: ResultBatch,
        behavior: CommandBehavior,
        owns_binding: bool,
    ) -> Self {
        conn.start_fetching();
        debug!(results = batch.len(), "reader opened");
        Self {
            conn,
            batch,
            behavior,
            state: ReaderState::BetweenResults,
            result_index: None,
            row_index: 0,
            row_pending: false,
            on_row: false,
            fields: Vec::new(),
            datums: Vec::new(),
            nulls: Vec::new(),
            owns_binding,
        }
    }

    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, ReaderState::Closed | ReaderState::Disposed)
    }

    /// Move to the next result of the batch.
    ///
    /// Returns `false` once the batch is exhausted, and on every call after that.
    ///
    /// # Errors
    /// Returns errors from fetching the first row; the reader is then consumed.
    pub fn next_result(&mut self) -> Result<bool, SpiBridgeError> {
        match self.state {
            ReaderState::Closed | ReaderState::Disposed | ReaderState::Consumed => {
                return Ok(false);
            }
            ReaderState::BeforeResult | ReaderState::InResult | ReaderState::BetweenResults => {}
        }

        let next = self.result_index.map_or(0, |i| i + 1);
        let Some(outcome) = self.batch.get(next) else {
            self.result_index = Some(self.batch.len());
            self.on_row = false;
            self.row_pending = false;
            self.state = ReaderState::Consumed;
            return Ok(false);
        };

        self.result_index = Some(next);
        self.fields = match outcome.tuple_table {
            Some(table) => field::describe_table(self.conn.backend(), table),
            None => Vec::new(),
        };
        self.datums = vec![Datum::NULL; self.fields.len()];
        self.nulls = vec![false; self.fields.len()];
        self.row_index = 0;
        self.row_pending = false;
        self.on_row = false;
        self.state = ReaderState::BeforeResult;

        if self.available_rows() > 0 {
            self.fetch_row(0)?;
            self.row_index = 1;
            self.row_pending = true;
        }
        Ok(true)
    }

    /// Advance to the next row of the current result.
    ///
    /// # Errors
    /// Returns errors from the native fetch; the reader is then consumed.
    pub fn read(&mut self) -> Result<bool, SpiBridgeError> {
        match self.state {
            ReaderState::BeforeResult => {
                self.state = ReaderState::InResult;
                self.on_row = self.row_pending;
                self.row_pending = false;
                Ok(self.on_row)
            }
            ReaderState::InResult => {
                if self.row_index < self.available_rows() {
                    self.fetch_row(self.row_index)?;
                    self.row_index += 1;
                    self.on_row = true;
                    Ok(true)
                } else {
                    self.on_row = false;
                    Ok(false)
                }
            }
            ReaderState::BetweenResults
            | ReaderState::Consumed
            | ReaderState::Closed
            | ReaderState::Disposed => Ok(false),
        }
    }

    fn current_outcome(&self) -> Option<StatementOutcome> {
        self.result_index.and_then(|i| self.batch.get(i))
    }

    /// Rows the current result can surface.
    fn available_rows(&self) -> u64 {
        if self.behavior.schema_only {
            return 0;
        }
        match self.current_outcome() {
            Some(StatementOutcome {
                tuple_table: Some(_),
                processed_rows,
            }) => processed_rows,
            _ => 0,
        }
    }

    fn fetch_row(&mut self, index: u64) -> Result<(), SpiBridgeError> {
        let table = self.current_outcome().and_then(|o| o.tuple_table);
        let result = match table {
            Some(table) => self.conn.backend().fetch_row(
                index,
                table,
                &mut self.datums,
                &mut self.nulls,
            ),
            None => Err(SpiBridgeError::State(
                "current result has no tuple table".to_string(),
            )),
        };
        if result.is_err() {
            self.state = ReaderState::Consumed;
            self.on_row = false;
        }
        result
    }

    fn check_open(&self) -> Result<(), SpiBridgeError> {
        if self.is_closed() {
            return Err(SpiBridgeError::State("Reader is closed".to_string()));
        }
        Ok(())
    }

    fn field(&self, ordinal: usize) -> Result<&FieldDescriptor, SpiBridgeError> {
        self.check_open()?;
        self.fields.get(ordinal).ok_or_else(|| {
            SpiBridgeError::IndexOutOfRange(format!(
                "ordinal {ordinal} is outside the {} column(s) of the current result",
                self.fields.len()
            ))
        })
    }

    fn row_field(&self, ordinal: usize) -> Result<&FieldDescriptor, SpiBridgeError> {
        self.check_open()?;
        if !self.on_row {
            return Err(SpiBridgeError::State("No row is available".to_string()));
        }
        self.field(ordinal)
    }

    /// Number of columns of the current result; zero when no result is current.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// # Errors
    /// Returns `IndexOutOfRange` for an unknown ordinal.
    pub fn get_name(&self, ordinal: usize) -> Result<&str, SpiBridgeError> {
        self.field(ordinal).map(|f| f.name.as_str())
    }

    /// # Errors
    /// Returns `IndexOutOfRange` for an unknown ordinal.
    pub fn get_type_oid(&self, ordinal: usize) -> Result<Oid, SpiBridgeError> {
        self.field(ordinal).map(|f| f.type_oid)
    }

    /// Ordinal of the column called `name`; an exact match wins over a case-insensitive one.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` when no column has that name.
    pub fn get_ordinal(&self, name: &str) -> Result<usize, SpiBridgeError> {
        self.check_open()?;
        self.fields
            .iter()
            .position(|f| f.name == name)
            .or_else(|| {
                self.fields
                    .iter()
                    .position(|f| f.name.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| {
                SpiBridgeError::IndexOutOfRange(format!("Field not found in row: {name}"))
            })
    }

    /// SQL-facing type name of a column, including its type modifier, e.g. `numeric(10,2)`.
    ///
    /// The type registry is loaded on first use.
    ///
    /// # Errors
    /// Returns `IndexOutOfRange` for an unknown ordinal, registry loading errors, or
    /// `TypeNotFound` when the engine's catalog has no such type.
    pub fn get_data_type_name(&mut self, ordinal: usize) -> Result<String, SpiBridgeError> {
        let (type_oid, type_modifier) = {
            let field = self.field(ordinal)?;
            (field.type_oid, field.type_modifier)
        };
        let registry = Arc::clone(self.conn.type_registry());
        let descriptor = registry.resolve(type_oid, self.conn.backend_mut())?;
        Ok(descriptor.display_name_with_facets(type_modifier))
    }

    /// # Errors
    /// Returns `State` without a current row and `IndexOutOfRange` for an unknown ordinal.
    pub fn is_db_null(&self, ordinal: usize) -> Result<bool, SpiBridgeError> {
        self.row_field(ordinal)?;
        Ok(self.nulls[ordinal])
    }

    /// Value of a column of the current row; SQL null comes back as `RowValues::Null`.
    ///
    /// # Errors
    /// Returns `State` without a current row, `IndexOutOfRange` for an unknown ordinal, and
    /// codec errors from the backend.
    pub fn get_value(&self, ordinal: usize) -> Result<RowValues, SpiBridgeError> {
        let type_oid = self.row_field(ordinal)?.type_oid;
        if self.nulls[ordinal] {
            return Ok(RowValues::Null);
        }
        self.conn.backend().decode_datum(self.datums[ordinal], type_oid)
    }

    /// All values of the current row.
    ///
    /// # Errors
    /// See [`get_value`](Self::get_value).
    pub fn get_values(&self) -> Result<Vec<RowValues>, SpiBridgeError> {
        (0..self.fields.len()).map(|i| self.get_value(i)).collect()
    }

    /// Typed value of a column of the current row.
    ///
    /// ```rust,no_run
    /// # use spi_bridge::prelude::*;
    /// # fn demo<B: SpiBackend>(reader: &DataReader<'_, B>) -> Result<(), SpiBridgeError> {
    /// let id: i32 = reader.get_field_value(0)?;
    /// let note: Option<String> = reader.get_field_value(1)?;
    /// # let _ = (id, note);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns `Cast` when the value (or null) does not fit `T`, plus the errors of
    /// [`get_value`](Self::get_value).
    pub fn get_field_value<T: FromSqlValue>(&self, ordinal: usize) -> Result<T, SpiBridgeError> {
        T::from_sql_value(self.get_value(ordinal)?)
    }

    /// # Errors
    /// Returns `IndexOutOfRange` for an unknown name, plus the errors of
    /// [`get_field_value`](Self::get_field_value).
    pub fn get_field_value_by_name<T: FromSqlValue>(&self, name: &str) -> Result<T, SpiBridgeError> {
        let ordinal = self.get_ordinal(name)?;
        self.get_field_value(ordinal)
    }

    /// # Errors
    /// See [`get_field_value`](Self::get_field_value).
    pub fn get_date(&self, ordinal: usize) -> Result<NaiveDate, SpiBridgeError> {
        self.get_field_value(ordinal)
    }

    /// Rows changed by the statements visited so far that produced no tuple table; `-1` when
    /// none of them did.
    #[must_use]
    pub fn records_affected(&self) -> i64 {
        let visited = self
            .result_index
            .map_or(0, |i| (i + 1).min(self.batch.len()));
        let affected: Vec<u64> = (0..visited)
            .filter_map(|i| self.batch.get(i))
            .filter(|outcome| outcome.tuple_table.is_none())
            .map(|outcome| outcome.processed_rows)
            .collect();
        if affected.is_empty() {
            return -1;
        }
        i64::try_from(affected.iter().sum::<u64>()).unwrap_or(i64::MAX)
    }

    /// Whether the current result has at least one row.
    #[must_use]
    pub fn has_rows(&self) -> bool {
        !self.is_closed() && self.available_rows() > 0
    }

    /// Close the reader and hand the connection back.
    pub fn close(&mut self) {
        self.shutdown(false);
    }

    /// Close the reader for good. Idempotent, and also what dropping the reader does.
    pub fn dispose(&mut self) {
        self.shutdown(true);
    }

    fn shutdown(&mut self, disposing: bool) {
        if self.is_closed() {
            if disposing {
                self.state = ReaderState::Disposed;
            }
            return;
        }

        self.state = if disposing {
            ReaderState::Disposed
        } else {
            ReaderState::Closed
        };
        self.on_row = false;
        self.row_pending = false;
        self.conn
            .finish_reader(self.owns_binding, self.behavior.close_connection);
        debug!(disposing, "reader closed");
    }

    /// # Errors
    /// See [`read`](Self::read). The token is accepted and not observed.
    pub async fn read_async(&mut self, _cancel: &CancellationToken) -> Result<bool, SpiBridgeError> {
        self.read()
    }

    /// # Errors
    /// See [`next_result`](Self::next_result). The token is accepted and not observed.
    pub async fn next_result_async(
        &mut self,
        _cancel: &CancellationToken,
    ) -> Result<bool, SpiBridgeError> {
        self.next_result()
    }

    pub async fn close_async(&mut self) {
        self.close();
    }

    pub async fn dispose_async(&mut self) {
        self.dispose();
    }
}

impl<B: SpiBackend> Drop for DataReader<'_, B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
