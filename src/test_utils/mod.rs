//! In-memory native substrate for tests.
//!
//! Compiled for the crate's own tests and, behind the `test-utils` feature, for downstream
//! crates that want to exercise commands and readers without an engine.

mod catalog;
mod fake_spi;

pub use catalog::{catalog_row, default_catalog};
pub use fake_spi::{FakeColumn, FakeSpi, Scripted, SpiCall, elevel};
