// Native execution surface.
//
// - handles: opaque handle types handed out by the substrate
// - gateway: prepare/execute requests with error-record translation

pub mod gateway;
pub mod handles;

pub use gateway::StatementOutcome;
pub use handles::{Datum, ErrorRecordHandle, PlanHandle, TupleTableHandle};

use crate::error::SpiBridgeError;
use crate::types::{Oid, RowValues};

/// Null-map marker for a null argument, as the executor expects it.
pub const NULL_MARKER: u8 = b'n';
/// Null-map marker for a present argument.
pub const NOT_NULL_MARKER: u8 = b' ';

/// Column metadata of a tuple table, one entry per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnProperties {
    pub type_oids: Vec<Oid>,
    pub names: Vec<String>,
    pub type_modifiers: Vec<i32>,
    pub type_sizes: Vec<i16>,
}

/// Copy of the native structured error record.
///
/// Produced by [`SpiBackend::error_record`]; every string is owned so nothing points back into
/// the record once it has been released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorData {
    pub elevel: i32,
    pub output_to_server: bool,
    pub output_to_client: bool,
    pub hide_stmt: bool,
    pub hide_ctx: bool,
    pub filename: Option<String>,
    pub lineno: i32,
    pub funcname: Option<String>,
    pub domain: Option<String>,
    pub context_domain: Option<String>,
    pub sqlerrcode: i32,
    pub message: Option<String>,
    pub detail: Option<String>,
    pub detail_log: Option<String>,
    pub hint: Option<String>,
    pub context: Option<String>,
    pub backtrace: Option<String>,
    pub message_id: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub column_name: Option<String>,
    pub datatype_name: Option<String>,
    pub constraint_name: Option<String>,
    pub cursorpos: i32,
    pub internalpos: i32,
    pub internalquery: Option<String>,
    pub saved_errno: i32,
}

/// The call surface of the embedded executor.
///
/// Implementations are strictly synchronous and expect at most one statement in flight.
/// Failing calls hand back an [`ErrorRecordHandle`] that must be passed to
/// [`release_error_record`](SpiBackend::release_error_record) exactly once.
pub trait SpiBackend {
    fn prepare(&mut self, query: &str, param_types: &[Oid]) -> Result<PlanHandle, ErrorRecordHandle>;

    /// Execute a prepared plan. `row_limit == 0` means no limit.
    fn execute_plan(
        &mut self,
        plan: PlanHandle,
        args: &[Datum],
        nulls: &[u8],
        read_only: bool,
        row_limit: i64,
    ) -> Result<Option<TupleTableHandle>, ErrorRecordHandle>;

    /// Execute query text directly. `row_limit == 0` means no limit.
    fn execute(
        &mut self,
        query: &str,
        read_only: bool,
        row_limit: i64,
    ) -> Result<Option<TupleTableHandle>, ErrorRecordHandle>;

    /// Rows processed by the most recent execution.
    fn row_count(&self) -> u64;

    fn column_count(&self, table: TupleTableHandle) -> usize;

    fn column_properties(&self, table: TupleTableHandle) -> ColumnProperties;

    /// Fill `datums` and `nulls` (both sized to the column count) with row `index`.
    fn fetch_row(
        &self,
        index: u64,
        table: TupleTableHandle,
        datums: &mut [Datum],
        nulls: &mut [bool],
    ) -> Result<(), SpiBridgeError>;

    /// OID of the row type that owns the table's columns.
    fn table_type_oid(&self, table: TupleTableHandle) -> Oid;

    fn error_record(&self, handle: &ErrorRecordHandle) -> ErrorData;

    fn error_severity_text(&self, elevel: i32) -> String;

    fn release_error_record(&mut self, handle: ErrorRecordHandle);

    fn engine_version(&self) -> String;

    fn commit(&mut self) -> Result<(), ErrorRecordHandle>;

    fn rollback(&mut self) -> Result<(), ErrorRecordHandle>;

    /// Serialize a parameter value for the given type. Never called with `RowValues::Null`.
    fn encode_datum(&mut self, type_oid: Oid, value: &RowValues) -> Result<Datum, SpiBridgeError>;

    /// Copy a non-null datum of the given type out of native memory.
    fn decode_datum(&self, datum: Datum, type_oid: Oid) -> Result<RowValues, SpiBridgeError>;
}
