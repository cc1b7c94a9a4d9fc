use spi_bridge::prelude::*;
use spi_bridge::test_utils::{FakeColumn, FakeSpi, SpiCall};
use spi_bridge::types::oid;

fn open(fake: FakeSpi) -> Result<Connection<FakeSpi>, SpiBridgeError> {
    let mut conn = Connection::new(fake);
    conn.open()?;
    Ok(conn)
}

#[test]
fn named_parameters_are_rewritten_and_bound_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_command("INSERT INTO t (id, name) VALUES ($1, $2)", 1);
    let mut conn = open(fake)?;

    let affected = Command::new("INSERT INTO t (id, name) VALUES (@id, :name)")
        .bind(Parameter::named("name", RowValues::Text("alice".into())))
        .bind(Parameter::named("@id", RowValues::Int(7)).with_db_type(DbType::Integer))
        .execute_non_query(&mut conn)?;
    assert_eq!(affected, 1);

    assert_eq!(
        conn.backend().calls(),
        &[
            SpiCall::Prepare {
                query: "INSERT INTO t (id, name) VALUES ($1, $2)".to_string(),
                param_types: vec![oid::INT4, oid::TEXT],
            },
            SpiCall::ExecutePlan {
                query: "INSERT INTO t (id, name) VALUES ($1, $2)".to_string(),
                args: vec![RowValues::Int(7), RowValues::Text("alice".into())],
                nulls: vec![b' ', b' '],
            },
        ]
    );
    Ok(())
}

#[test]
fn positional_parameters_pass_through() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_rows(
        "SELECT name FROM t WHERE id = $1",
        vec![FakeColumn::new("name", oid::TEXT)],
        vec![vec![RowValues::Text("bob".into())]],
    );
    let mut conn = open(fake)?;

    let name = Command::new("SELECT name FROM t WHERE id = $1")
        .bind(Parameter::positional(RowValues::Int(2)))
        .execute_scalar(&mut conn)?;
    assert_eq!(name, Some(RowValues::Text("bob".into())));
    assert!(matches!(
        &conn.backend().calls()[0],
        SpiCall::Prepare { param_types, .. } if param_types == &vec![oid::INT8]
    ));
    Ok(())
}

#[test]
fn mixing_styles_fails_before_any_native_call() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;

    let err = Command::new("SELECT $1, @b")
        .bind(Parameter::positional(RowValues::Int(1)))
        .bind(Parameter::named("b", RowValues::Int(2)))
        .execute_reader(&mut conn)
        .err();
    assert!(matches!(err, Some(SpiBridgeError::ParameterBinding(_))));

    let batch = Batch::new()
        .push(BatchCommand::new("SELECT $1").bind(Parameter::positional(RowValues::Int(1))))
        .push(BatchCommand::new("SELECT @b").bind(Parameter::named("b", RowValues::Int(2))));
    assert!(matches!(
        batch.execute_reader(&mut conn),
        Err(SpiBridgeError::ParameterBinding(_))
    ));

    assert!(conn.backend().calls().is_empty());
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}

#[test]
fn unknown_named_parameter_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    let err = Command::new("SELECT @missing")
        .bind(Parameter::named("present", RowValues::Int(1)))
        .execute_reader(&mut conn)
        .err();
    assert!(matches!(err, Some(SpiBridgeError::ParameterBinding(_))));
    assert!(conn.backend().calls().is_empty());
    Ok(())
}

#[test]
fn batch_commands_bind_their_own_parameters() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_command("UPDATE a SET x = $1", 2);
    fake.script_command("UPDATE b SET y = $1", 3);
    let mut conn = open(fake)?;

    let batch = Batch::new()
        .push(BatchCommand::new("UPDATE a SET x = @x").bind(Parameter::named("x", RowValues::Int(1))))
        .push(BatchCommand::new("UPDATE b SET y = @y").bind(Parameter::named("y", RowValues::Bool(true))));
    assert_eq!(batch.execute_non_query(&mut conn)?, 5);

    let executed: Vec<Vec<RowValues>> = conn
        .backend()
        .calls()
        .iter()
        .filter_map(|call| match call {
            SpiCall::ExecutePlan { args, .. } => Some(args.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        executed,
        vec![vec![RowValues::Int(1)], vec![RowValues::Bool(true)]]
    );
    Ok(())
}

#[test]
fn rewrite_can_be_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_rows(
        "SELECT @a",
        vec![FakeColumn::new("a", oid::INT8)],
        vec![vec![RowValues::Int(5)]],
    );
    let config = ConnectionConfig::builder().named_parameter_rewrite(false).finish();
    let mut conn = Connection::with_config(fake, config);
    conn.open()?;

    let value = Command::new("SELECT @a")
        .bind(Parameter::named("a", RowValues::Int(5)))
        .execute_scalar(&mut conn)?;
    assert_eq!(value, Some(RowValues::Int(5)));
    assert_eq!(conn.backend().executed_queries(), vec!["SELECT @a"]);
    Ok(())
}

#[test]
fn values_that_do_not_fit_the_declared_type_fail_to_bind() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_command("INSERT INTO t VALUES ($1)", 1);
    let mut conn = open(fake)?;

    let err = Command::new("INSERT INTO t VALUES ($1)")
        .bind(Parameter::positional(RowValues::Int(100_000)).with_db_type(DbType::Smallint))
        .execute_reader(&mut conn)
        .err();
    assert!(matches!(err, Some(SpiBridgeError::ParameterBinding(_))));
    assert!(conn.backend().executed_queries().is_empty());
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}
