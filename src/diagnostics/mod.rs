//! Translation of native error records into [`DatabaseError`].

mod sqlstate;

pub use sqlstate::{decode_sqlstate, encode_sqlstate};

use serde::Serialize;
use thiserror::Error;

use crate::spi::{ErrorRecordHandle, SpiBackend};

/// An error reported by the embedded engine, with every diagnostic field copied out of the
/// native record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{sql_state}: {message_text}")]
pub struct DatabaseError {
    /// Localized severity, e.g. `ERROR`.
    pub severity: String,
    /// Numeric error level as the engine reported it.
    pub severity_level: i32,
    /// Severity as reported by the engine, never localized.
    pub invariant_severity: String,
    /// Five-character SQLSTATE, or the native code in decimal when it cannot be decoded.
    pub sql_state: String,
    /// The encoded error code as the engine reported it.
    pub native_error_code: i32,
    pub message_text: String,
    pub detail: Option<String>,
    pub hint: Option<String>,
    /// 1-based character offset into the statement text; 0 when absent.
    pub position: i32,
    pub internal_position: i32,
    pub internal_query: Option<String>,
    #[serde(rename = "where")]
    pub where_: Option<String>,
    pub schema_name: Option<String>,
    pub table_name: Option<String>,
    pub column_name: Option<String>,
    pub data_type_name: Option<String>,
    pub constraint_name: Option<String>,
    pub file: Option<String>,
    pub line: Option<String>,
    pub routine: Option<String>,
}

/// Copy the record behind `handle` into a [`DatabaseError`] and release it.
///
/// The handle is consumed; the record is released exactly once, before the error is built.
pub fn translate<B: SpiBackend + ?Sized>(backend: &mut B, handle: ErrorRecordHandle) -> DatabaseError {
    let data = backend.error_record(&handle);
    let severity = backend.error_severity_text(data.elevel);
    backend.release_error_record(handle);

    DatabaseError {
        invariant_severity: severity.clone(),
        severity,
        severity_level: data.elevel,
        sql_state: decode_sqlstate(data.sqlerrcode),
        native_error_code: data.sqlerrcode,
        message_text: data.message.unwrap_or_default(),
        detail: data.detail,
        hint: data.hint,
        position: data.cursorpos,
        internal_position: data.internalpos,
        internal_query: data.internalquery,
        where_: data.context,
        schema_name: data.schema_name,
        table_name: data.table_name,
        column_name: data.column_name,
        data_type_name: data.datatype_name,
        constraint_name: data.constraint_name,
        file: data.filename,
        line: (data.lineno > 0).then(|| data.lineno.to_string()),
        routine: data.funcname,
    }
}
