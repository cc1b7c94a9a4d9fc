use crate::types::{Oid, RowValues, oid};

/// One catalog row in the shape the type catalog query returns.
#[must_use]
pub fn catalog_row(namespace: &str, type_oid: Oid, name: &str, kind: char, element: Option<Oid>) -> Vec<RowValues> {
    vec![
        RowValues::Text(namespace.to_string()),
        RowValues::Int(i64::from(type_oid)),
        RowValues::Text(name.to_string()),
        RowValues::Text(kind.to_string()),
        RowValues::Bool(false),
        element.map_or(RowValues::Null, |e| RowValues::Int(i64::from(e))),
    ]
}

/// A small built-in catalog: the common base and pseudo types, a range type and two arrays.
#[must_use]
pub fn default_catalog() -> Vec<Vec<RowValues>> {
    let base = [
        (oid::BOOL, "bool"),
        (oid::BYTEA, "bytea"),
        (oid::CHAR, "char"),
        (oid::NAME, "name"),
        (oid::INT8, "int8"),
        (oid::INT2, "int2"),
        (oid::INT4, "int4"),
        (oid::TEXT, "text"),
        (oid::OID, "oid"),
        (oid::JSON, "json"),
        (oid::FLOAT4, "float4"),
        (oid::FLOAT8, "float8"),
        (oid::BPCHAR, "bpchar"),
        (oid::VARCHAR, "varchar"),
        (oid::DATE, "date"),
        (oid::TIME, "time"),
        (oid::TIMESTAMP, "timestamp"),
        (oid::TIMESTAMPTZ, "timestamptz"),
        (oid::INTERVAL, "interval"),
        (oid::TIMETZ, "timetz"),
        (oid::BIT, "bit"),
        (oid::VARBIT, "varbit"),
        (oid::NUMERIC, "numeric"),
        (oid::JSONB, "jsonb"),
    ];
    let mut rows: Vec<Vec<RowValues>> = base
        .iter()
        .map(|(type_oid, name)| catalog_row("pg_catalog", *type_oid, name, 'b', None))
        .collect();
    rows.push(catalog_row("pg_catalog", oid::UNKNOWN, "unknown", 'p', None));
    rows.push(catalog_row("pg_catalog", oid::RECORD, "record", 'p', None));
    rows.push(catalog_row("pg_catalog", oid::VOID, "void", 'p', None));
    rows.push(catalog_row("pg_catalog", 3904, "int4range", 'r', None));
    rows.push(catalog_row("pg_catalog", oid::INT4_ARRAY, "_int4", 'a', Some(oid::INT4)));
    rows.push(catalog_row("pg_catalog", oid::TEXT_ARRAY, "_text", 'a', Some(oid::TEXT)));
    rows
}
