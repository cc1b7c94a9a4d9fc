use crate::spi::{StatementOutcome, TupleTableHandle};

/// The tuple tables produced by one executor invocation, in statement order.
///
/// Each entry pairs an optional tuple table with the number of rows the statement processed.
/// Statements that produce no tuple table (plain DML, utility commands) still get an entry so
/// their processed count stays visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultBatch {
    tuple_tables: Vec<Option<TupleTableHandle>>,
    processed_rows: Vec<u64>,
}

impl ResultBatch {
    /// Create an empty batch with room for `capacity` statements
    ///
    /// # Arguments
    ///
    /// * `capacity` - The expected number of statements
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tuple_tables: Vec::with_capacity(capacity),
            processed_rows: Vec::with_capacity(capacity),
        }
    }

    /// Append the outcome of the next statement.
    pub fn push(&mut self, outcome: StatementOutcome) {
        self.tuple_tables.push(outcome.tuple_table);
        self.processed_rows.push(outcome.processed_rows);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tuple_tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuple_tables.is_empty()
    }

    /// Outcome of the statement at `index`, or `None` past the end
    #[must_use]
    pub fn get(&self, index: usize) -> Option<StatementOutcome> {
        let tuple_table = *self.tuple_tables.get(index)?;
        let processed_rows = *self.processed_rows.get(index)?;
        Some(StatementOutcome {
            tuple_table,
            processed_rows,
        })
    }

    #[must_use]
    pub fn tuple_tables(&self) -> &[Option<TupleTableHandle>] {
        &self.tuple_tables
    }

    #[must_use]
    pub fn processed_rows(&self) -> &[u64] {
        &self.processed_rows
    }

    /// Sum of processed rows over the first `visited` statements.
    #[must_use]
    pub fn processed_through(&self, visited: usize) -> u64 {
        self.processed_rows.iter().take(visited).sum()
    }
}
