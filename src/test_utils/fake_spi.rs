use std::collections::HashMap;

use crate::catalog::LOAD_TYPES_QUERY;
use crate::diagnostics::encode_sqlstate;
use crate::error::SpiBridgeError;
use crate::spi::{
    ColumnProperties, Datum, ErrorData, ErrorRecordHandle, PlanHandle, SpiBackend,
    TupleTableHandle,
};
use crate::types::{Oid, RowValues, oid};

use super::catalog::default_catalog;

/// Engine error levels, as the executor numbers them.
pub mod elevel {
    pub const DEBUG1: i32 = 14;
    pub const LOG: i32 = 15;
    pub const INFO: i32 = 17;
    pub const NOTICE: i32 = 18;
    pub const WARNING: i32 = 19;
    pub const ERROR: i32 = 21;
    pub const FATAL: i32 = 22;
    pub const PANIC: i32 = 23;
}

/// Column of a scripted result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeColumn {
    pub name: String,
    pub type_oid: Oid,
    pub type_modifier: i32,
    pub type_size: i16,
}

impl FakeColumn {
    pub fn new(name: impl Into<String>, type_oid: Oid) -> Self {
        let type_size = match type_oid {
            oid::BOOL | oid::CHAR => 1,
            oid::INT2 => 2,
            oid::INT4 | oid::OID | oid::FLOAT4 | oid::DATE => 4,
            oid::INT8 | oid::FLOAT8 | oid::TIMESTAMP | oid::TIMESTAMPTZ | oid::TIME => 8,
            oid::NAME => 64,
            _ => -1,
        };
        Self {
            name: name.into(),
            type_oid,
            type_modifier: -1,
            type_size,
        }
    }

    #[must_use]
    pub fn with_type_modifier(mut self, type_modifier: i32) -> Self {
        self.type_modifier = type_modifier;
        self
    }
}

/// How the fake engine answers one query text.
#[derive(Debug, Clone, PartialEq)]
pub enum Scripted {
    /// A tuple table with these columns and rows.
    Rows {
        columns: Vec<FakeColumn>,
        rows: Vec<Vec<RowValues>>,
    },
    /// No tuple table; `processed` rows changed.
    Command { processed: u64 },
    /// The engine raises this error.
    Error(ErrorData),
}

/// Native calls recorded by [`FakeSpi`], in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SpiCall {
    Prepare { query: String, param_types: Vec<Oid> },
    ExecutePlan { query: String, args: Vec<RowValues>, nulls: Vec<u8> },
    Execute { query: String, read_only: bool },
    Commit,
    Rollback,
}

#[derive(Debug)]
struct FakeTable {
    columns: Vec<FakeColumn>,
    rows: Vec<Vec<Option<Datum>>>,
}

/// In-memory stand-in for the native executor.
///
/// Plans, tuple tables, datums and error records live in arenas and are addressed by the
/// handles the trait hands out. Queries are answered from a script keyed by trimmed text;
/// unscripted text fails with a syntax error record. `SELECT 1`, the type catalog query and
/// transaction utility statements are answered out of the box.
#[derive(Debug)]
pub struct FakeSpi {
    script: HashMap<String, Scripted>,
    plans: Vec<String>,
    tables: Vec<FakeTable>,
    datums: Vec<RowValues>,
    error_records: Vec<Option<ErrorData>>,
    last_row_count: u64,
    version: String,
    calls: Vec<SpiCall>,
    commit_failure: Option<ErrorData>,
    fetch_failure: Option<u64>,
}

impl Default for FakeSpi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSpi {
    #[must_use]
    pub fn new() -> Self {
        let mut fake = Self {
            script: HashMap::new(),
            plans: Vec::new(),
            tables: Vec::new(),
            // slot 0 backs Datum::NULL
            datums: vec![RowValues::Null],
            error_records: Vec::new(),
            last_row_count: 0,
            version: "16.2".to_string(),
            calls: Vec::new(),
            commit_failure: None,
            fetch_failure: None,
        };
        fake.script_rows(
            "SELECT 1",
            vec![FakeColumn::new("?column?", oid::INT4)],
            vec![vec![RowValues::Int(1)]],
        );
        fake.with_catalog(default_catalog())
    }

    /// Replace the rows answering the type catalog query.
    #[must_use]
    pub fn with_catalog(mut self, rows: Vec<Vec<RowValues>>) -> Self {
        let columns = vec![
            FakeColumn::new("nspname", oid::NAME),
            FakeColumn::new("oid", oid::OID),
            FakeColumn::new("typname", oid::NAME),
            FakeColumn::new("typtype", oid::CHAR),
            FakeColumn::new("typnotnull", oid::BOOL),
            FakeColumn::new("elemtypoid", oid::OID),
        ];
        self.script_rows(LOAD_TYPES_QUERY, columns, rows);
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn script(&mut self, query: &str, response: Scripted) {
        self.script.insert(query.trim().to_string(), response);
    }

    pub fn script_rows(&mut self, query: &str, columns: Vec<FakeColumn>, rows: Vec<Vec<RowValues>>) {
        self.script(query, Scripted::Rows { columns, rows });
    }

    pub fn script_command(&mut self, query: &str, processed: u64) {
        self.script(query, Scripted::Command { processed });
    }

    pub fn script_error(&mut self, query: &str, error: ErrorData) {
        self.script(query, Scripted::Error(error));
    }

    /// Make the next commit fail with `error`.
    pub fn fail_next_commit(&mut self, error: ErrorData) {
        self.commit_failure = Some(error);
    }

    /// Make fetching row `index` of any table fail.
    pub fn fail_fetch_at(&mut self, index: u64) {
        self.fetch_failure = Some(index);
    }

    /// An `ERROR`-level record with the given SQLSTATE and message.
    #[must_use]
    pub fn error(sql_state: &str, message: &str) -> ErrorData {
        ErrorData {
            elevel: elevel::ERROR,
            output_to_client: true,
            sqlerrcode: encode_sqlstate(sql_state).unwrap_or_default(),
            message: Some(message.to_string()),
            ..ErrorData::default()
        }
    }

    #[must_use]
    pub fn calls(&self) -> &[SpiCall] {
        &self.calls
    }

    /// Queries sent through `execute` or `execute_plan`, in order.
    #[must_use]
    pub fn executed_queries(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SpiCall::Execute { query, .. } | SpiCall::ExecutePlan { query, .. } => {
                    Some(query.as_str())
                }
                _ => None,
            })
            .collect()
    }

    /// Error records handed out and not yet released.
    #[must_use]
    pub fn outstanding_error_records(&self) -> usize {
        self.error_records.iter().filter(|r| r.is_some()).count()
    }

    fn raise(&mut self, error: ErrorData) -> ErrorRecordHandle {
        self.last_row_count = 0;
        self.error_records.push(Some(error));
        ErrorRecordHandle(self.error_records.len() - 1)
    }

    fn intern(&mut self, value: RowValues) -> Datum {
        self.datums.push(value);
        Datum(self.datums.len() - 1)
    }

    fn run(&mut self, query: &str) -> Result<Option<TupleTableHandle>, ErrorRecordHandle> {
        let key = query.trim();
        let response = match self.script.get(key) {
            Some(response) => response.clone(),
            None if is_utility(key) => Scripted::Command { processed: 0 },
            None => {
                let mut error = Self::error("42601", &format!("unscripted query: {key}"));
                error.cursorpos = 1;
                Scripted::Error(error)
            }
        };

        match response {
            Scripted::Rows { columns, rows } => {
                let rows: Vec<Vec<Option<Datum>>> = rows
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|value| {
                                if value.is_null() {
                                    None
                                } else {
                                    Some(self.intern(value))
                                }
                            })
                            .collect()
                    })
                    .collect();
                self.last_row_count = rows.len() as u64;
                self.tables.push(FakeTable { columns, rows });
                Ok(Some(TupleTableHandle(self.tables.len() - 1)))
            }
            Scripted::Command { processed } => {
                self.last_row_count = processed;
                Ok(None)
            }
            Scripted::Error(error) => Err(self.raise(error)),
        }
    }

    fn table(&self, table: TupleTableHandle) -> Option<&FakeTable> {
        self.tables.get(table.0)
    }
}

fn is_utility(query: &str) -> bool {
    let upper = query.to_ascii_uppercase();
    ["SET ", "SAVEPOINT ", "RELEASE ", "ROLLBACK TO "]
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

impl SpiBackend for FakeSpi {
    fn prepare(&mut self, query: &str, param_types: &[Oid]) -> Result<PlanHandle, ErrorRecordHandle> {
        self.calls.push(SpiCall::Prepare {
            query: query.to_string(),
            param_types: param_types.to_vec(),
        });
        // syntax errors surface at prepare time
        let syntax_code = encode_sqlstate("42601").unwrap_or_default();
        let syntax_error = match self.script.get(query.trim()) {
            Some(Scripted::Error(error)) if error.sqlerrcode == syntax_code => Some(error.clone()),
            _ => None,
        };
        if let Some(error) = syntax_error {
            return Err(self.raise(error));
        }
        self.plans.push(query.to_string());
        Ok(PlanHandle(self.plans.len() - 1))
    }

    fn execute_plan(
        &mut self,
        plan: PlanHandle,
        args: &[Datum],
        nulls: &[u8],
        _read_only: bool,
        _row_limit: i64,
    ) -> Result<Option<TupleTableHandle>, ErrorRecordHandle> {
        let query = self.plans.get(plan.0).cloned().unwrap_or_default();
        let values = args
            .iter()
            .map(|datum| self.datums.get(datum.0).cloned().unwrap_or(RowValues::Null))
            .collect();
        self.calls.push(SpiCall::ExecutePlan {
            query: query.clone(),
            args: values,
            nulls: nulls.to_vec(),
        });
        self.run(&query)
    }

    fn execute(
        &mut self,
        query: &str,
        read_only: bool,
        _row_limit: i64,
    ) -> Result<Option<TupleTableHandle>, ErrorRecordHandle> {
        self.calls.push(SpiCall::Execute {
            query: query.to_string(),
            read_only,
        });
        self.run(query)
    }

    fn row_count(&self) -> u64 {
        self.last_row_count
    }

    fn column_count(&self, table: TupleTableHandle) -> usize {
        self.table(table).map_or(0, |t| t.columns.len())
    }

    fn column_properties(&self, table: TupleTableHandle) -> ColumnProperties {
        let Some(table) = self.table(table) else {
            return ColumnProperties::default();
        };
        ColumnProperties {
            type_oids: table.columns.iter().map(|c| c.type_oid).collect(),
            names: table.columns.iter().map(|c| c.name.clone()).collect(),
            type_modifiers: table.columns.iter().map(|c| c.type_modifier).collect(),
            type_sizes: table.columns.iter().map(|c| c.type_size).collect(),
        }
    }

    fn fetch_row(
        &self,
        index: u64,
        table: TupleTableHandle,
        datums: &mut [Datum],
        nulls: &mut [bool],
    ) -> Result<(), SpiBridgeError> {
        if self.fetch_failure == Some(index) {
            return Err(SpiBridgeError::State(format!("fetch of row {index} failed")));
        }
        let row = self
            .table(table)
            .and_then(|t| usize::try_from(index).ok().and_then(|i| t.rows.get(i)))
            .ok_or_else(|| {
                SpiBridgeError::IndexOutOfRange(format!("row {index} is not in table {}", table.0))
            })?;
        for (col, cell) in row.iter().enumerate() {
            if col >= datums.len() || col >= nulls.len() {
                break;
            }
            datums[col] = cell.unwrap_or(Datum::NULL);
            nulls[col] = cell.is_none();
        }
        Ok(())
    }

    fn table_type_oid(&self, _table: TupleTableHandle) -> Oid {
        oid::RECORD
    }

    fn error_record(&self, handle: &ErrorRecordHandle) -> ErrorData {
        self.error_records
            .get(handle.0)
            .cloned()
            .flatten()
            .unwrap_or_default()
    }

    fn error_severity_text(&self, level: i32) -> String {
        match level {
            10..=14 => "DEBUG",
            elevel::LOG | 16 => "LOG",
            elevel::INFO => "INFO",
            elevel::NOTICE => "NOTICE",
            elevel::WARNING | 20 => "WARNING",
            elevel::ERROR => "ERROR",
            elevel::FATAL => "FATAL",
            elevel::PANIC => "PANIC",
            _ => "???",
        }
        .to_string()
    }

    fn release_error_record(&mut self, handle: ErrorRecordHandle) {
        if let Some(slot) = self.error_records.get_mut(handle.0) {
            *slot = None;
        }
    }

    fn engine_version(&self) -> String {
        self.version.clone()
    }

    fn commit(&mut self) -> Result<(), ErrorRecordHandle> {
        self.calls.push(SpiCall::Commit);
        match self.commit_failure.take() {
            Some(error) => Err(self.raise(error)),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> Result<(), ErrorRecordHandle> {
        self.calls.push(SpiCall::Rollback);
        Ok(())
    }

    fn encode_datum(&mut self, type_oid: Oid, value: &RowValues) -> Result<Datum, SpiBridgeError> {
        let fits = match (type_oid, value) {
            (oid::INT2, RowValues::Int(v)) => i16::try_from(*v).is_ok(),
            (oid::INT4, RowValues::Int(v)) => i32::try_from(*v).is_ok(),
            (oid::INT2 | oid::INT4 | oid::INT8 | oid::OID, other) => {
                matches!(other, RowValues::Int(_))
            }
            (oid::BOOL, other) => matches!(other, RowValues::Bool(_)),
            _ => true,
        };
        if !fits {
            return Err(SpiBridgeError::ParameterBinding(format!(
                "Can't encode a {} value as type {type_oid}",
                value.kind()
            )));
        }
        Ok(self.intern(value.clone()))
    }

    fn decode_datum(&self, datum: Datum, _type_oid: Oid) -> Result<RowValues, SpiBridgeError> {
        self.datums
            .get(datum.0)
            .cloned()
            .ok_or_else(|| SpiBridgeError::State(format!("datum {} is not live", datum.0)))
    }
}
