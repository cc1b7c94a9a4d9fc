use std::time::Duration;

use spi_bridge::prelude::*;
use spi_bridge::test_utils::FakeSpi;

fn open(fake: FakeSpi) -> Result<Connection<FakeSpi>, SpiBridgeError> {
    let mut conn = Connection::new(fake);
    conn.open()?;
    Ok(conn)
}

#[tokio::test]
async fn async_reader_walks_results() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    let cancel = CancellationToken::new();

    let mut reader = Command::new("SELECT 1; SELECT 1")
        .execute_reader_async(&mut conn, &cancel)
        .await?;
    let mut rows = 0;
    while reader.next_result_async(&cancel).await? {
        while reader.read_async(&cancel).await? {
            assert_eq!(reader.get_value(0)?, RowValues::Int(1));
            rows += 1;
        }
    }
    reader.close_async().await;
    assert_eq!(reader.state(), ReaderState::Closed);
    reader.dispose_async().await;
    assert_eq!(reader.state(), ReaderState::Disposed);
    drop(reader);

    assert_eq!(rows, 2);
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}

#[tokio::test]
async fn cancelled_tokens_are_not_observed() -> Result<(), Box<dyn std::error::Error>> {
    let mut fake = FakeSpi::new();
    fake.script_command("UPDATE t SET a = 1", 3);
    let mut conn = open(fake)?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let scalar = Command::new("SELECT 1")
        .execute_scalar_async(&mut conn, &cancel)
        .await?;
    assert_eq!(scalar, Some(RowValues::Int(1)));

    let affected = Command::new("UPDATE t SET a = 1")
        .execute_non_query_async(&mut conn, &cancel)
        .await?;
    assert_eq!(affected, 3);
    Ok(())
}

#[tokio::test]
async fn closing_a_reader_signals_completion() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    let completion = conn.reader_completion();
    let cancel = CancellationToken::new();

    let batch = Batch::new().push(BatchCommand::new("SELECT 1"));
    {
        let mut reader = batch.execute_reader_async(&mut conn, &cancel).await?;
        assert!(reader.next_result_async(&cancel).await?);
        reader.close_async().await;
    }

    tokio::time::timeout(Duration::from_secs(1), completion.notified()).await?;
    assert_eq!(conn.state(), ConnectionState::Open);
    Ok(())
}

#[tokio::test]
async fn async_transaction_control() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = open(FakeSpi::new())?;
    let cancel = CancellationToken::new();

    let tx = conn.begin_transaction(IsolationLevel::ReadCommitted)?;
    tx.commit_async(&cancel).await?;
    let tx = conn.begin_transaction(IsolationLevel::ReadCommitted)?;
    tx.rollback_async(&cancel).await?;

    let calls = conn.backend().calls();
    assert_eq!(calls.last(), Some(&spi_bridge::test_utils::SpiCall::Rollback));
    Ok(())
}
