use tracing::{debug, warn};

use crate::diagnostics::translate;
use crate::error::SpiBridgeError;
use crate::types::Oid;

use super::{Datum, ErrorRecordHandle, PlanHandle, SpiBackend, TupleTableHandle};

/// What one executed statement left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOutcome {
    /// `None` when the statement produced no tuple table (utility and plain DML statements).
    pub tuple_table: Option<TupleTableHandle>,
    pub processed_rows: u64,
}

fn fail<B: SpiBackend + ?Sized>(backend: &mut B, handle: ErrorRecordHandle) -> SpiBridgeError {
    warn!("native layer reported an error record");
    SpiBridgeError::from(translate(backend, handle))
}

/// Prepare a plan for `query` with the given parameter types.
///
/// # Errors
/// Returns `SpiBridgeError::Execution` with the translated native error.
pub fn prepare<B: SpiBackend + ?Sized>(
    backend: &mut B,
    query: &str,
    param_types: &[Oid],
) -> Result<PlanHandle, SpiBridgeError> {
    debug!(query, nargs = param_types.len(), "prepare");
    match backend.prepare(query, param_types) {
        Ok(plan) => Ok(plan),
        Err(handle) => Err(fail(backend, handle)),
    }
}

/// Execute a prepared plan and capture its processed-row count.
///
/// # Errors
/// Returns `SpiBridgeError::Execution` with the translated native error.
pub fn execute_plan<B: SpiBackend + ?Sized>(
    backend: &mut B,
    plan: PlanHandle,
    args: &[Datum],
    nulls: &[u8],
    read_only: bool,
    row_limit: i64,
) -> Result<StatementOutcome, SpiBridgeError> {
    match backend.execute_plan(plan, args, nulls, read_only, row_limit) {
        Ok(tuple_table) => Ok(StatementOutcome {
            tuple_table,
            processed_rows: backend.row_count(),
        }),
        Err(handle) => Err(fail(backend, handle)),
    }
}

/// Execute query text without parameters and capture its processed-row count.
///
/// # Errors
/// Returns `SpiBridgeError::Execution` with the translated native error.
pub fn execute<B: SpiBackend + ?Sized>(
    backend: &mut B,
    query: &str,
    read_only: bool,
    row_limit: i64,
) -> Result<StatementOutcome, SpiBridgeError> {
    debug!(query, read_only, "execute");
    match backend.execute(query, read_only, row_limit) {
        Ok(tuple_table) => Ok(StatementOutcome {
            tuple_table,
            processed_rows: backend.row_count(),
        }),
        Err(handle) => Err(fail(backend, handle)),
    }
}

/// Commit the current native transaction.
///
/// # Errors
/// Returns `SpiBridgeError::Execution` with the translated native error.
pub fn commit<B: SpiBackend + ?Sized>(backend: &mut B) -> Result<(), SpiBridgeError> {
    backend.commit().map_err(|handle| fail(backend, handle))
}

/// Roll back the current native transaction.
///
/// # Errors
/// Returns `SpiBridgeError::Execution` with the translated native error.
pub fn rollback<B: SpiBackend + ?Sized>(backend: &mut B) -> Result<(), SpiBridgeError> {
    backend.rollback().map_err(|handle| fail(backend, handle))
}
