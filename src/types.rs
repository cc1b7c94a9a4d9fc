use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

/// Native type identifier (`pg_type.oid`).
pub type Oid = u32;

/// Well-known OIDs of the built-in catalog.
pub mod oid {
    use super::Oid;

    pub const BOOL: Oid = 16;
    pub const BYTEA: Oid = 17;
    pub const CHAR: Oid = 18;
    pub const NAME: Oid = 19;
    pub const INT8: Oid = 20;
    pub const INT2: Oid = 21;
    pub const INT4: Oid = 23;
    pub const TEXT: Oid = 25;
    pub const OID: Oid = 26;
    pub const JSON: Oid = 114;
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;
    pub const UNKNOWN: Oid = 705;
    pub const BPCHAR: Oid = 1042;
    pub const VARCHAR: Oid = 1043;
    pub const DATE: Oid = 1082;
    pub const TIME: Oid = 1083;
    pub const TIMESTAMP: Oid = 1114;
    pub const TIMESTAMPTZ: Oid = 1184;
    pub const INTERVAL: Oid = 1186;
    pub const TIMETZ: Oid = 1266;
    pub const BIT: Oid = 1560;
    pub const VARBIT: Oid = 1562;
    pub const NUMERIC: Oid = 1700;
    pub const RECORD: Oid = 2249;
    pub const VOID: Oid = 2278;
    pub const JSONB: Oid = 3802;
    pub const INT4_ARRAY: Oid = 1007;
    pub const TEXT_ARRAY: Oid = 1009;
}

/// Values that can be read from a row or bound as command parameters.
///
/// Every decoded datum is copied into one of these variants before it reaches caller code,
/// so a value never refers back into native memory.
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Calendar date
    Date(NaiveDate),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short label of the variant, used in cast diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowValues::Int(_) => "integer",
            RowValues::Float(_) => "float",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "boolean",
            RowValues::Timestamp(_) => "timestamp",
            RowValues::Date(_) => "date",
            RowValues::Null => "null",
            RowValues::JSON(_) => "json",
            RowValues::Blob(_) => "bytea",
        }
    }

    /// OID used when a parameter carries no explicit database type.
    #[must_use]
    pub fn inferred_oid(&self) -> Oid {
        match self {
            RowValues::Int(_) => oid::INT8,
            RowValues::Float(_) => oid::FLOAT8,
            RowValues::Text(_) => oid::TEXT,
            RowValues::Bool(_) => oid::BOOL,
            RowValues::Timestamp(_) => oid::TIMESTAMP,
            RowValues::Date(_) => oid::DATE,
            RowValues::Null => oid::UNKNOWN,
            RowValues::JSON(_) => oid::JSONB,
            RowValues::Blob(_) => oid::BYTEA,
        }
    }
}

/// Database type a parameter is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    Smallint,
    Integer,
    Bigint,
    Real,
    Double,
    Numeric,
    Boolean,
    Text,
    Varchar,
    Char,
    Name,
    Bytea,
    Date,
    Timestamp,
    TimestampTz,
    Json,
    Jsonb,
    Oid,
    Unknown,
}

impl DbType {
    #[must_use]
    pub fn oid(self) -> Oid {
        match self {
            DbType::Smallint => oid::INT2,
            DbType::Integer => oid::INT4,
            DbType::Bigint => oid::INT8,
            DbType::Real => oid::FLOAT4,
            DbType::Double => oid::FLOAT8,
            DbType::Numeric => oid::NUMERIC,
            DbType::Boolean => oid::BOOL,
            DbType::Text => oid::TEXT,
            DbType::Varchar => oid::VARCHAR,
            DbType::Char => oid::BPCHAR,
            DbType::Name => oid::NAME,
            DbType::Bytea => oid::BYTEA,
            DbType::Date => oid::DATE,
            DbType::Timestamp => oid::TIMESTAMP,
            DbType::TimestampTz => oid::TIMESTAMPTZ,
            DbType::Json => oid::JSON,
            DbType::Jsonb => oid::JSONB,
            DbType::Oid => oid::OID,
            DbType::Unknown => oid::UNKNOWN,
        }
    }
}

/// Flags a caller passes when executing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandBehavior {
    /// Close the connection when the reader is closed.
    pub close_connection: bool,
    /// Expose result metadata only; rows are never surfaced.
    pub schema_only: bool,
}

impl CommandBehavior {
    #[must_use]
    pub fn with_close_connection(mut self, close_connection: bool) -> Self {
        self.close_connection = close_connection;
        self
    }

    #[must_use]
    pub fn with_schema_only(mut self, schema_only: bool) -> Self {
        self.schema_only = schema_only;
        self
    }
}
