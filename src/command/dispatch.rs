use tracing::debug;

use crate::error::SpiBridgeError;
use crate::params::{self, BindingStyle, Parameter};
use crate::results::ResultBatch;
use crate::spi::{SpiBackend, gateway};
use crate::translation::parse_statements;

/// One statement ready for the executor, with the parameters it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStatement {
    pub sql: String,
    pub parameters: Vec<Parameter>,
}

/// A unit of command text and the parameter list that owns it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Unit<'a> {
    pub text: &'a str,
    pub parameters: &'a [Parameter],
}

/// Turn command units into executable statements without touching the native layer.
///
/// Named parameters are matched to the `$n` placeholders of each statement; statements without
/// a local list fall back to the parameters of their unit.
pub(crate) fn plan(
    units: &[Unit<'_>],
    rewrite_named: bool,
) -> Result<Vec<PlannedStatement>, SpiBridgeError> {
    if units.is_empty() || units.iter().any(|u| u.text.trim().is_empty()) {
        return Err(SpiBridgeError::InvalidArgument(
            "The command text was not set".to_string(),
        ));
    }

    let style = params::batch_binding_style(units.iter().map(|u| u.parameters))?;
    let named = style == Some(BindingStyle::Named);

    let mut planned = Vec::new();
    for unit in units {
        for statement in parse_statements(unit.text, named && rewrite_named) {
            let local = if named && !statement.parameter_names.is_empty() {
                params::bind_named(&statement.parameter_names, unit.parameters)?
            } else {
                Vec::new()
            };
            let parameters = if local.is_empty() {
                unit.parameters.to_vec()
            } else {
                local
            };
            planned.push(PlannedStatement {
                sql: statement.sql,
                parameters,
            });
        }
    }
    Ok(planned)
}

/// Execute planned statements in order and collect their tuple tables.
///
/// A failure discards everything gathered so far.
///
/// # Errors
/// Returns codec errors and `SpiBridgeError::Execution` for native failures.
pub fn execute_statements<B: SpiBackend + ?Sized>(
    backend: &mut B,
    statements: &[PlannedStatement],
) -> Result<ResultBatch, SpiBridgeError> {
    let mut batch = ResultBatch::with_capacity(statements.len());
    for statement in statements {
        let outcome = if statement.parameters.is_empty() {
            gateway::execute(backend, &statement.sql, false, 0)?
        } else {
            let args = params::serialize(backend, &statement.parameters)?;
            let plan = gateway::prepare(backend, &statement.sql, &args.type_oids)?;
            gateway::execute_plan(backend, plan, &args.datums, &args.nulls, false, 0)?
        };
        debug!(
            processed = outcome.processed_rows,
            has_table = outcome.tuple_table.is_some(),
            "statement executed"
        );
        batch.push(outcome);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowValues;

    #[test]
    fn empty_text_is_rejected() {
        let err = plan(
            &[Unit {
                text: "   ",
                parameters: &[],
            }],
            true,
        )
        .unwrap_err();
        assert!(matches!(err, SpiBridgeError::InvalidArgument(_)));
    }

    #[test]
    fn positional_parameters_are_shared_by_statements() {
        let params = vec![Parameter::positional(RowValues::Int(1))];
        let planned = plan(
            &[Unit {
                text: "SELECT $1; SELECT $1 + 1",
                parameters: &params,
            }],
            true,
        )
        .unwrap();
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[1].parameters, params);
    }

    #[test]
    fn named_parameters_bind_per_statement() {
        let params = vec![
            Parameter::named("a", RowValues::Int(1)),
            Parameter::named("b", RowValues::Text("x".into())),
        ];
        let planned = plan(
            &[Unit {
                text: "SELECT @b, @a; SELECT 2",
                parameters: &params,
            }],
            true,
        )
        .unwrap();
        assert_eq!(planned[0].sql, "SELECT $1, $2");
        assert_eq!(planned[0].parameters[0].value, RowValues::Text("x".into()));
        assert_eq!(planned[0].parameters[1].value, RowValues::Int(1));
        assert_eq!(planned[1].sql, "SELECT 2");
        assert_eq!(planned[1].parameters, params);
    }
}
