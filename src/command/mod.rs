//! Commands and batches: statement planning, dispatch and the reader entry points.

mod dispatch;

pub use dispatch::{PlannedStatement, execute_statements};

use tokio_util::sync::CancellationToken;

use crate::connection::Connection;
use crate::error::SpiBridgeError;
use crate::params::Parameter;
use crate::reader::DataReader;
use crate::spi::SpiBackend;
use crate::types::{CommandBehavior, RowValues};

use dispatch::Unit;

/// Command text plus its parameters.
///
/// The text may hold several statements separated by `;`; each one becomes a result of the
/// reader.
///
/// ```rust
/// use spi_bridge::prelude::*;
///
/// let cmd = Command::new("INSERT INTO t (id, name) VALUES (@id, @name)")
///     .bind(Parameter::named("id", RowValues::Int(1)))
///     .bind(Parameter::named("name", RowValues::Text("alice".into())));
/// assert_eq!(cmd.parameters().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    text: String,
    parameters: Vec<Parameter>,
    behavior: CommandBehavior,
}

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
            behavior: CommandBehavior::default(),
        }
    }

    #[must_use]
    pub fn bind(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: CommandBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[must_use]
    pub fn behavior(&self) -> CommandBehavior {
        self.behavior
    }

    fn units(&self) -> Vec<Unit<'_>> {
        vec![Unit {
            text: &self.text,
            parameters: &self.parameters,
        }]
    }

    /// Execute every statement and return a reader over their results.
    ///
    /// # Errors
    /// Returns `InvalidArgument` for empty text, `State` when the connection is not open,
    /// `ParameterBinding` for mixed or missing parameters (before anything is executed), and
    /// `Execution` when the engine rejects a statement.
    pub fn execute_reader<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
    ) -> Result<DataReader<'c, B>, SpiBridgeError> {
        open_reader(conn, &self.units(), self.behavior)
    }

    /// First column of the first row of the first result; `None` when there is no row.
    ///
    /// # Errors
    /// See [`execute_reader`](Self::execute_reader).
    pub fn execute_scalar<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<Option<RowValues>, SpiBridgeError> {
        scalar(self.execute_reader(conn)?)
    }

    /// Run every statement and return the number of rows changed, or `-1` when no statement
    /// changed rows.
    ///
    /// # Errors
    /// See [`execute_reader`](Self::execute_reader).
    pub fn execute_non_query<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<i64, SpiBridgeError> {
        non_query(self.execute_reader(conn)?)
    }

    /// # Errors
    /// See [`execute_reader`](Self::execute_reader). The token is accepted and not observed.
    pub async fn execute_reader_async<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
        _cancel: &CancellationToken,
    ) -> Result<DataReader<'c, B>, SpiBridgeError> {
        self.execute_reader(conn)
    }

    /// # Errors
    /// See [`execute_scalar`](Self::execute_scalar). The token is accepted and not observed.
    pub async fn execute_scalar_async<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
        _cancel: &CancellationToken,
    ) -> Result<Option<RowValues>, SpiBridgeError> {
        self.execute_scalar(conn)
    }

    /// # Errors
    /// See [`execute_non_query`](Self::execute_non_query). The token is accepted and not
    /// observed.
    pub async fn execute_non_query_async<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
        _cancel: &CancellationToken,
    ) -> Result<i64, SpiBridgeError> {
        self.execute_non_query(conn)
    }
}

/// One command of a [`Batch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchCommand {
    pub text: String,
    pub parameters: Vec<Parameter>,
}

impl BatchCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn bind(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// Several commands executed together; each produces its own results.
///
/// All parameters across the batch must share one binding style.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    commands: Vec<BatchCommand>,
    behavior: CommandBehavior,
}

impl Batch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(mut self, command: BatchCommand) -> Self {
        self.commands.push(command);
        self
    }

    #[must_use]
    pub fn with_behavior(mut self, behavior: CommandBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    #[must_use]
    pub fn commands(&self) -> &[BatchCommand] {
        &self.commands
    }

    fn units(&self) -> Vec<Unit<'_>> {
        self.commands
            .iter()
            .map(|c| Unit {
                text: &c.text,
                parameters: &c.parameters,
            })
            .collect()
    }

    /// # Errors
    /// See [`Command::execute_reader`]; an empty batch is an `InvalidArgument` error.
    pub fn execute_reader<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
    ) -> Result<DataReader<'c, B>, SpiBridgeError> {
        open_reader(conn, &self.units(), self.behavior)
    }

    /// # Errors
    /// See [`Command::execute_reader`].
    pub fn execute_scalar<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<Option<RowValues>, SpiBridgeError> {
        scalar(self.execute_reader(conn)?)
    }

    /// # Errors
    /// See [`Command::execute_reader`].
    pub fn execute_non_query<B: SpiBackend>(
        &self,
        conn: &mut Connection<B>,
    ) -> Result<i64, SpiBridgeError> {
        non_query(self.execute_reader(conn)?)
    }

    /// # Errors
    /// See [`Command::execute_reader`]. The token is accepted and not observed.
    pub async fn execute_reader_async<'c, B: SpiBackend>(
        &self,
        conn: &'c mut Connection<B>,
        _cancel: &CancellationToken,
    ) -> Result<DataReader<'c, B>, SpiBridgeError> {
        self.execute_reader(conn)
    }
}

fn open_reader<'c, B: SpiBackend>(
    conn: &'c mut Connection<B>,
    units: &[Unit<'_>],
    behavior: CommandBehavior,
) -> Result<DataReader<'c, B>, SpiBridgeError> {
    conn.check_ready()?;
    let statements = dispatch::plan(units, conn.config().rewrite_named_parameters)?;

    let owns_binding = conn.begin_execution()?;
    match execute_statements(conn.backend_mut(), &statements) {
        Ok(batch) => Ok(DataReader::new(conn, batch, behavior, owns_binding)),
        Err(err) => {
            conn.abort_execution(owns_binding);
            Err(err)
        }
    }
}

fn scalar<B: SpiBackend>(mut reader: DataReader<'_, B>) -> Result<Option<RowValues>, SpiBridgeError> {
    let mut value = None;
    if reader.next_result()? && reader.read()? && reader.field_count() > 0 {
        value = Some(reader.get_value(0)?);
    }
    while reader.next_result()? {}
    reader.close();
    Ok(value)
}

fn non_query<B: SpiBackend>(mut reader: DataReader<'_, B>) -> Result<i64, SpiBridgeError> {
    while reader.next_result()? {}
    let affected = reader.records_affected();
    reader.close();
    Ok(affected)
}
