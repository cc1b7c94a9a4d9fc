//! Opaque handles handed out by the native substrate.
//!
//! Handles are plain indices and carry no ownership. The substrate frees what they point at
//! when the surrounding execution context ends; readers hold them only while they borrow the
//! connection.

/// A prepared query plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanHandle(pub usize);

/// An in-memory result table produced by one executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TupleTableHandle(pub usize);

/// A pointer-sized native value. Only the backend that produced it can decode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Datum(pub usize);

impl Datum {
    pub const NULL: Datum = Datum(0);
}

/// A structured error record allocated by the native layer.
///
/// Neither `Copy` nor `Clone`; releasing it consumes the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct ErrorRecordHandle(pub usize);
