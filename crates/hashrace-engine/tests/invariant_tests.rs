use hashrace_crypto::solution_commitment;
use hashrace_engine::{CompetitionConfig, CompetitionEngine, CompetitionError};
use hashrace_ledger::{LedgerReader, MemoryLedger};
use hashrace_types::{AccountAddress, Amount, BlockHash};
use std::sync::Arc;

fn addr(byte: u8) -> AccountAddress {
    AccountAddress::from_bytes([byte; 32])
}

async fn funded_engine(accounts: &[AccountAddress]) -> (CompetitionEngine, Arc<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.advance(20).await;

    let engine =
        CompetitionEngine::new(CompetitionConfig::default(), addr(0xEE), ledger.clone()).unwrap();

    for account in accounts {
        engine
            .balances()
            .credit(*account, Amount::from_units(100_000))
            .await
            .unwrap();
    }

    (engine, ledger)
}

async fn total_value(engine: &CompetitionEngine) -> Amount {
    engine
        .balances()
        .total()
        .await
        .checked_add(engine.total_banked().await)
        .unwrap()
}

#[tokio::test]
async fn value_is_conserved_across_lifecycle() {
    let accounts = [addr(1), addr(2), addr(3)];
    let (engine, ledger) = funded_engine(&accounts).await;
    let bet = engine.bet_size();
    let task = ledger.block_hash(1).await.unwrap();
    let initial = total_value(&engine).await;

    for (i, account) in accounts.iter().enumerate() {
        let solution = format!("solution-{}", i);
        engine
            .claim_solution(*account, task, solution_commitment(solution.as_bytes()), bet)
            .await
            .unwrap();
        assert_eq!(total_value(&engine).await, initial);
    }

    // Reveals move no value at all.
    for (i, account) in accounts.iter().enumerate() {
        let solution = format!("solution-{}", i);
        let _ = engine
            .submit_solution(*account, task, solution.as_bytes())
            .await;
        assert_eq!(total_value(&engine).await, initial);
    }

    ledger.advance(engine.blocks_to_create_task()).await;
    engine.claim_reward(task).await.unwrap();

    assert_eq!(total_value(&engine).await, initial);
    assert_eq!(engine.total_banked().await, Amount::ZERO);
}

#[tokio::test]
async fn bank_equals_sum_of_stakes() {
    let accounts = [addr(1), addr(2), addr(3), addr(4)];
    let (engine, ledger) = funded_engine(&accounts).await;
    let bet = engine.bet_size();
    let task = ledger.block_hash(1).await.unwrap();

    let mut expected = Amount::ZERO;
    for (i, account) in accounts.iter().enumerate() {
        // Stakes above the minimum count in full.
        let stake = Amount::from_units(bet.to_units() + i as u64 * 7);
        engine
            .claim_solution(*account, task, solution_commitment(&[i as u8]), stake)
            .await
            .unwrap();

        expected = expected.checked_add(stake).unwrap();
        assert_eq!(engine.task(&task).await.unwrap().bank, expected);
    }

    assert_eq!(engine.commitment_count(&task).await, accounts.len());
}

#[tokio::test]
async fn reveal_outcome_is_order_independent() {
    let accounts = [addr(1), addr(2)];
    let solutions: [&[u8]; 2] = [b"first", b"second"];

    let mut results = Vec::new();
    for order in [[0usize, 1], [1, 0]] {
        // Identical chains replay to identical tasks and scores.
        let (engine, ledger) = funded_engine(&accounts).await;
        let bet = engine.bet_size();
        let task = ledger.block_hash(1).await.unwrap();

        for i in 0..2 {
            engine
                .claim_solution(accounts[i], task, solution_commitment(solutions[i]), bet)
                .await
                .unwrap();
        }
        for &i in &order {
            // One of the two orders rejects the weaker reveal; the final
            // state must not depend on which.
            let _ = engine.submit_solution(accounts[i], task, solutions[i]).await;
        }

        let view = engine.task(&task).await.unwrap();
        results.push((view.score, view.leader));
    }

    assert_eq!(results[0], results[1]);
}

#[tokio::test]
async fn claim_succeeds_up_to_the_window_edge() {
    let accounts = [addr(1), addr(2)];
    let (engine, ledger) = funded_engine(&accounts).await;
    let bet = engine.bet_size();
    let window = engine.blocks_to_create_task();

    // Deepest in-range lookback.
    let edge = ledger.block_hash(window - 1).await.unwrap();
    engine
        .claim_solution(addr(1), edge, solution_commitment(b"edge"), bet)
        .await
        .unwrap();

    // One deeper is expired.
    let expired = ledger.block_hash(window).await.unwrap();
    let err = engine
        .claim_solution(addr(2), expired, solution_commitment(b"late"), bet)
        .await;
    assert!(matches!(err, Err(CompetitionError::TaskNotOngoing(_))));
}

#[tokio::test]
async fn failed_operations_leave_no_trace() {
    let accounts = [addr(1)];
    let (engine, ledger) = funded_engine(&accounts).await;
    let bet = engine.bet_size();
    let initial = total_value(&engine).await;

    let unrelated = BlockHash::new(b"unrelated");
    let _ = engine
        .claim_solution(addr(1), unrelated, solution_commitment(b"s"), bet)
        .await;
    let _ = engine.submit_solution(addr(1), unrelated, b"s").await;
    let _ = engine.claim_reward(unrelated).await;

    let task = ledger.block_hash(1).await.unwrap();
    let _ = engine
        .claim_solution(addr(1), task, solution_commitment(b"s"), Amount::ZERO)
        .await;

    assert_eq!(engine.task_count().await, 0);
    assert_eq!(total_value(&engine).await, initial);
    assert_eq!(
        engine.balances().balance_of(addr(1)).await,
        Amount::from_units(100_000)
    );
}
