use crate::spi::{SpiBackend, TupleTableHandle};
use crate::types::{Oid, oid};

/// Description of one column of the current result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Row type that owns the column.
    pub table_oid: Oid,
    pub ordinal: usize,
    pub type_oid: Oid,
    pub type_size: i16,
    /// `-1` when the column has no type modifier.
    pub type_modifier: i32,
    /// Always `0`: values are exchanged in text form.
    pub format_code: i16,
}

pub(crate) fn describe_table<B: SpiBackend + ?Sized>(
    backend: &B,
    table: TupleTableHandle,
) -> Vec<FieldDescriptor> {
    let ncols = backend.column_count(table);
    if ncols == 0 {
        return Vec::new();
    }
    let props = backend.column_properties(table);
    let table_oid = backend.table_type_oid(table);

    (0..ncols)
        .map(|i| FieldDescriptor {
            name: props.names.get(i).cloned().unwrap_or_default(),
            table_oid,
            ordinal: i,
            type_oid: props.type_oids.get(i).copied().unwrap_or(oid::UNKNOWN),
            type_size: props.type_sizes.get(i).copied().unwrap_or(-1),
            type_modifier: props.type_modifiers.get(i).copied().unwrap_or(-1),
            format_code: 0,
        })
        .collect()
}
