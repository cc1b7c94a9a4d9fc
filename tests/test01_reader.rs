use chrono::NaiveDate;
use spi_bridge::prelude::*;
use spi_bridge::test_utils::{FakeColumn, FakeSpi};
use spi_bridge::types::oid;

fn open(fake: FakeSpi) -> Result<Connection<FakeSpi>, SpiBridgeError> {
    let mut conn = Connection::new(fake);
    conn.open()?;
    Ok(conn)
}

fn people() -> FakeSpi {
    let mut fake = FakeSpi::new();
    fake.script_rows(
        "SELECT id, name, born FROM people",
        vec![
            FakeColumn::new("id", oid::INT4),
            FakeColumn::new("name", oid::TEXT),
            FakeColumn::new("born", oid::DATE),
        ],
        vec![
            vec![
                RowValues::Int(1),
                RowValues::Text("ada".into()),
                RowValues::Date(NaiveDate::from_ymd_opt(1815, 12, 10).unwrap()),
            ],
            vec![RowValues::Int(2), RowValues::Null, RowValues::Null],
            vec![
                RowValues::Int(3),
                RowValues::Text("grace".into()),
                RowValues::Date(NaiveDate::from_ymd_opt(1906, 12, 9).unwrap()),
            ],
        ],
    );
    fake
}

#[test]
fn select_one_yields_one_row_then_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    let mut reader = Command::new("SELECT 1").execute_reader(&mut conn)?;

    assert_eq!(reader.state(), ReaderState::BetweenResults);
    assert!(reader.next_result()?);
    assert_eq!(reader.field_count(), 1);
    assert_eq!(reader.get_name(0)?, "?column?");
    assert_eq!(reader.get_type_oid(0)?, oid::INT4);

    assert!(reader.read()?);
    assert_eq!(reader.get_value(0)?, RowValues::Int(1));
    assert_eq!(reader.get_field_value::<i32>(0)?, 1);
    assert!(!reader.read()?);

    assert!(!reader.next_result()?);
    assert!(!reader.next_result()?);
    assert_eq!(reader.state(), ReaderState::Consumed);
    Ok(())
}

#[test]
fn every_statement_becomes_a_result() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(people())?;
    let mut reader =
        Command::new("SELECT 1; SELECT id, name, born FROM people; SELECT 1").execute_reader(&mut conn)?;

    let mut results = 0;
    while reader.next_result()? {
        results += 1;
    }
    assert_eq!(results, 3);
    assert!(!reader.next_result()?);
    assert!(!reader.read()?);
    Ok(())
}

#[test]
fn read_walks_up_to_the_processed_count() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(people())?;
    let mut reader = Command::new("SELECT id, name, born FROM people").execute_reader(&mut conn)?;

    assert!(reader.next_result()?);
    assert!(reader.has_rows());
    let mut ids = Vec::new();
    while reader.read()? {
        ids.push(reader.get_field_value::<i64>(0)?);
    }
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(!reader.read()?);
    Ok(())
}

#[test]
fn null_columns_only_fit_nullable_targets() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(people())?;
    let mut reader = Command::new("SELECT id, name, born FROM people").execute_reader(&mut conn)?;
    assert!(reader.next_result()?);
    assert!(reader.read()?);
    assert!(reader.read()?);

    assert!(reader.is_db_null(1)?);
    assert_eq!(reader.get_value(1)?, RowValues::Null);
    assert!(matches!(
        reader.get_field_value::<String>(1),
        Err(SpiBridgeError::Cast(_))
    ));
    assert_eq!(reader.get_field_value::<Option<String>>(1)?, None);
    assert_eq!(reader.get_field_value::<RowValues>(1)?, RowValues::Null);
    assert!(matches!(reader.get_date(2), Err(SpiBridgeError::Cast(_))));
    assert_eq!(reader.get_field_value::<Option<i32>>(0)?, Some(2));
    Ok(())
}

#[test]
fn access_by_name_and_typed_values() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(people())?;
    let mut reader = Command::new("SELECT id, name, born FROM people").execute_reader(&mut conn)?;
    assert!(reader.next_result()?);
    assert!(reader.read()?);

    assert_eq!(reader.get_ordinal("NAME")?, 1);
    assert_eq!(reader.get_field_value_by_name::<String>("name")?, "ada");
    assert_eq!(
        reader.get_date(2)?,
        NaiveDate::from_ymd_opt(1815, 12, 10).unwrap()
    );
    assert_eq!(reader.get_values()?.len(), 3);
    assert!(matches!(
        reader.get_field_value::<bool>(0),
        Err(SpiBridgeError::Cast(_))
    ));
    assert!(matches!(
        reader.get_ordinal("missing"),
        Err(SpiBridgeError::IndexOutOfRange(_))
    ));
    assert!(matches!(
        reader.get_value(3),
        Err(SpiBridgeError::IndexOutOfRange(_))
    ));

    let fields = reader.fields();
    assert_eq!(fields[2].name, "born");
    assert_eq!(fields[2].ordinal, 2);
    assert_eq!(fields[2].type_oid, oid::DATE);
    assert_eq!(fields[2].table_oid, oid::RECORD);
    assert_eq!(fields[2].format_code, 0);
    Ok(())
}

#[test]
fn dml_with_null_parameter_has_no_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_command("INSERT INTO t VALUES ($1)", 1);
    let mut conn = open(fake)?;

    {
        let mut reader = Command::new("INSERT INTO t VALUES ($1)")
            .bind(Parameter::positional(RowValues::Null))
            .execute_reader(&mut conn)?;
        assert!(reader.next_result()?);
        assert_eq!(reader.field_count(), 0);
        assert!(!reader.has_rows());
        assert!(!reader.read()?);
        assert!(matches!(reader.get_value(0), Err(SpiBridgeError::State(_))));
        assert_eq!(reader.records_affected(), 1);
    }

    let calls = conn.backend().calls();
    assert!(matches!(
        &calls[0],
        spi_bridge::test_utils::SpiCall::Prepare { param_types, .. } if param_types == &vec![oid::UNKNOWN]
    ));
    assert!(matches!(
        &calls[1],
        spi_bridge::test_utils::SpiCall::ExecutePlan { nulls, .. } if nulls == &vec![b'n']
    ));
    Ok(())
}

#[test]
fn row_access_needs_a_current_row() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(people())?;
    let mut reader = Command::new("SELECT id, name, born FROM people").execute_reader(&mut conn)?;

    assert!(!reader.read()?);
    assert!(matches!(reader.get_value(0), Err(SpiBridgeError::State(_))));

    assert!(reader.next_result()?);
    // the first row is fetched but not current until read
    assert!(matches!(reader.get_value(0), Err(SpiBridgeError::State(_))));
    assert_eq!(reader.get_name(0)?, "id");
    Ok(())
}

#[test]
fn schema_only_exposes_fields_without_rows() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(people())?;
    let mut reader = Command::new("SELECT id, name, born FROM people")
        .with_behavior(CommandBehavior::default().with_schema_only(true))
        .execute_reader(&mut conn)?;

    assert!(reader.next_result()?);
    assert_eq!(reader.field_count(), 3);
    assert_eq!(reader.get_name(1)?, "name");
    assert!(!reader.has_rows());
    assert!(!reader.read()?);
    Ok(())
}

#[test]
fn close_is_idempotent_and_returns_the_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    {
        let mut reader = Command::new("SELECT 1").execute_reader(&mut conn)?;
        assert!(reader.next_result()?);
        reader.close();
        assert_eq!(reader.state(), ReaderState::Closed);
        reader.close();
        assert_eq!(reader.state(), ReaderState::Closed);
        reader.dispose();
        assert_eq!(reader.state(), ReaderState::Disposed);
        reader.close();
        assert_eq!(reader.state(), ReaderState::Disposed);

        assert!(!reader.read()?);
        assert!(!reader.next_result()?);
        assert!(matches!(reader.get_value(0), Err(SpiBridgeError::State(_))));
        assert!(matches!(reader.get_name(0), Err(SpiBridgeError::State(_))));
    }
    assert_eq!(conn.state(), ConnectionState::Open);
    assert_eq!(conn.backend().executed_queries(), vec!["SELECT 1"]);
    Ok(())
}

#[test]
fn dropping_a_reader_disposes_it() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    {
        let mut reader = Command::new("SELECT 1").execute_reader(&mut conn)?;
        assert!(reader.next_result()?);
    }
    assert_eq!(conn.state(), ConnectionState::Open);
    assert_eq!(
        Command::new("SELECT 1").execute_scalar(&mut conn)?,
        Some(RowValues::Int(1))
    );
    Ok(())
}

#[test]
fn close_connection_behavior_closes_the_connection() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    {
        let mut reader = Command::new("SELECT 1")
            .with_behavior(CommandBehavior::default().with_close_connection(true))
            .execute_reader(&mut conn)?;
        assert!(reader.next_result()?);
        reader.close();
    }
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(matches!(
        Command::new("SELECT 1").execute_reader(&mut conn),
        Err(SpiBridgeError::State(_))
    ));
    conn.open()?;
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}

#[test]
fn reader_scoped_binding_is_released_on_close() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConnectionConfig::default().with_bind_on_open(false);
    let mut conn = Connection::with_config(FakeSpi::new(), config);
    conn.open()?;
    assert_eq!(conn.binding_scope(), BindingScope::None);
    {
        let mut reader = Command::new("SELECT 1").execute_reader(&mut conn)?;
        assert!(reader.next_result()?);
    }
    assert_eq!(conn.binding_scope(), BindingScope::None);

    let mut bound = open(FakeSpi::new())?;
    assert_eq!(bound.binding_scope(), BindingScope::Connection);
    Command::new("SELECT 1").execute_non_query(&mut bound)?;
    assert_eq!(bound.binding_scope(), BindingScope::Connection);
    Ok(())
}

#[test]
fn fetch_failure_consumes_the_reader() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = people();
    fake.fail_fetch_at(1);
    let mut conn = open(fake)?;
    let mut reader = Command::new("SELECT id, name, born FROM people").execute_reader(&mut conn)?;

    assert!(reader.next_result()?);
    assert!(reader.read()?);
    assert!(reader.read().is_err());
    assert_eq!(reader.state(), ReaderState::Consumed);
    assert!(!reader.read()?);
    assert!(!reader.next_result()?);
    Ok(())
}

#[test]
fn first_row_failure_in_next_result_consumes_the_reader() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = people();
    fake.fail_fetch_at(0);
    let mut conn = open(fake)?;
    {
        let mut reader =
            Command::new("SELECT id, name, born FROM people; SELECT 1").execute_reader(&mut conn)?;

        assert!(reader.next_result().is_err());
        assert_eq!(reader.state(), ReaderState::Consumed);
        assert!(!reader.read()?);
        assert!(!reader.next_result()?);
        assert!(matches!(reader.get_value(0), Err(SpiBridgeError::State(_))));
    }
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}

#[test]
fn scalar_and_non_query_drain_every_result() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = people();
    fake.script_command("UPDATE people SET name = 'x'", 3);
    fake.script_command("DELETE FROM people WHERE id = 2", 1);
    fake.script_rows("SELECT name FROM nobody", vec![FakeColumn::new("name", oid::TEXT)], vec![]);
    let mut conn = open(fake)?;

    let affected = Command::new("UPDATE people SET name = 'x'; DELETE FROM people WHERE id = 2")
        .execute_non_query(&mut conn)?;
    assert_eq!(affected, 4);
    assert_eq!(Command::new("SELECT 1").execute_non_query(&mut conn)?, -1);

    let scalar = Command::new("SELECT id, name, born FROM people; SELECT 1").execute_scalar(&mut conn)?;
    assert_eq!(scalar, Some(RowValues::Int(1)));
    assert_eq!(
        Command::new("SELECT name FROM nobody").execute_scalar(&mut conn)?,
        None
    );
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}

#[test]
fn commands_are_validated_before_dispatch() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = Connection::new(FakeSpi::new());
    assert!(matches!(
        Command::new("SELECT 1").execute_reader(&mut conn),
        Err(SpiBridgeError::State(_))
    ));

    conn.open()?;
    assert!(matches!(
        Command::new("  ").execute_reader(&mut conn),
        Err(SpiBridgeError::InvalidArgument(_))
    ));
    assert!(matches!(
        Batch::new().execute_reader(&mut conn),
        Err(SpiBridgeError::InvalidArgument(_))
    ));
    assert!(conn.backend().calls().is_empty());
    assert!(matches!(conn.open(), Err(SpiBridgeError::State(_))));
    Ok(())
}

#[test]
fn capability_traits_drive_commands_and_cursors() -> Result<(), Box<dyn std::error::Error>> {
    fn count_rows<C: RowCursor>(cursor: &mut C) -> Result<usize, SpiBridgeError> {
        let mut rows = 0;
        while cursor.next_result()? {
            while cursor.read()? {
                rows += 1;
            }
        }
        cursor.close();
        Ok(rows)
    }

    let mut conn = open(people())?;
    let command = conn.create_command("SELECT id, name, born FROM people; SELECT 1");
    let mut reader = Executable::execute_reader(&command, &mut conn)?;
    assert_eq!(count_rows(&mut reader)?, 4);
    Ok(())
}
