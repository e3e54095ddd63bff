//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 批量变更队列测试

use habitsync::{BatchConfig, BatchMutationQueue, SyncError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

mod common;

fn fast_config() -> BatchConfig {
    BatchConfig {
        max_round_size: 10,
        round_pause_ms: 5,
        max_queue_size: 1000,
    }
}

#[tokio::test]
async fn test_25_operations_drain_in_3_rounds_in_order() {
    common::setup_logging();

    let queue = BatchMutationQueue::new(fast_config());
    let order: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

    let mut tickets = Vec::new();
    for i in 0..25 {
        let order = order.clone();
        let ticket = queue
            .add(async move {
                order.lock().unwrap().push(i);
                Ok(())
            })
            .await
            .expect("add should succeed");
        tickets.push(ticket);
    }

    // All 25 promises resolve
    for ticket in tickets {
        ticket.wait().await.expect("operation should resolve");
    }

    // ceil(25/10) rounds, at most 10 per round, enqueue order across rounds
    let executed = order.lock().unwrap().clone();
    assert_eq!(executed.len(), 25);
    let round1: std::collections::HashSet<usize> = executed[0..10].iter().copied().collect();
    let round2: std::collections::HashSet<usize> = executed[10..20].iter().copied().collect();
    let round3: std::collections::HashSet<usize> = executed[20..25].iter().copied().collect();
    assert_eq!(round1, (0..10).collect::<std::collections::HashSet<usize>>());
    assert_eq!(round2, (10..20).collect::<std::collections::HashSet<usize>>());
    assert_eq!(round3, (20..25).collect::<std::collections::HashSet<usize>>());

    let stats = queue.stats();
    assert_eq!(stats.rounds, 3);
    assert_eq!(stats.executed, 25);
    assert_eq!(stats.failed, 0);

    // Queue drains back to idle
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(queue.len().await, 0);
    assert!(queue.is_idle().await);
}

#[tokio::test]
async fn test_failing_operation_does_not_affect_siblings_or_next_round() {
    common::setup_logging();

    let queue = BatchMutationQueue::new(BatchConfig {
        max_round_size: 5,
        round_pause_ms: 5,
        max_queue_size: 1000,
    });
    let completed = Arc::new(AtomicUsize::new(0));

    let mut tickets = Vec::new();
    for i in 0..8 {
        let completed = completed.clone();
        let ticket = queue
            .add(async move {
                completed.fetch_add(1, Ordering::SeqCst);
                if i == 2 {
                    Err(SyncError::Remote("backend rejected delete".to_string()))
                } else {
                    Ok(())
                }
            })
            .await
            .expect("add should succeed");
        tickets.push(ticket);
    }

    for (i, ticket) in tickets.into_iter().enumerate() {
        let result = ticket.wait().await;
        if i == 2 {
            assert!(matches!(result, Err(SyncError::Remote(_))));
        } else {
            result.expect("sibling operations should settle");
        }
    }

    // Every operation ran exactly once across both rounds
    assert_eq!(completed.load(Ordering::SeqCst), 8);
    let stats = queue.stats();
    assert_eq!(stats.rounds, 2);
    assert_eq!(stats.executed, 8);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_add_rejected_when_queue_full() {
    common::setup_logging();

    let queue = BatchMutationQueue::new(BatchConfig {
        max_round_size: 2,
        round_pause_ms: 1,
        max_queue_size: 2,
    });
    let gate = Arc::new(Semaphore::new(0));

    let mut tickets = Vec::new();
    for _ in 0..2 {
        let gate = gate.clone();
        let ticket = queue
            .add(async move {
                let _permit = gate.acquire().await;
                Ok(())
            })
            .await
            .expect("add within capacity should succeed");
        tickets.push(ticket);
    }

    let gate3 = gate.clone();
    let overflow = queue.add(async move {
        let _permit = gate3.acquire().await;
        Ok(())
    });
    assert!(matches!(overflow.await, Err(SyncError::QueueFull(2))));

    // Release the gate so the accepted operations can finish
    gate.add_permits(2);
    for ticket in tickets {
        ticket.wait().await.expect("operation should resolve");
    }
}

#[tokio::test]
async fn test_close_discards_queued_but_not_inflight_operations() {
    common::setup_logging();

    let queue = BatchMutationQueue::new(BatchConfig {
        max_round_size: 1,
        round_pause_ms: 1,
        max_queue_size: 1000,
    });
    let gate = Arc::new(Semaphore::new(0));

    let mut tickets = Vec::new();
    for _ in 0..3 {
        let gate = gate.clone();
        let ticket = queue
            .add(async move {
                let _permit = gate.acquire().await;
                Ok(())
            })
            .await
            .expect("add should succeed");
        tickets.push(ticket);
    }

    // Let the drain loop pull the first operation into a round
    tokio::time::sleep(Duration::from_millis(10)).await;

    queue.close().await;

    // Adding after close is rejected
    let rejected = queue.add(async { Ok(()) }).await;
    assert!(matches!(rejected, Err(SyncError::QueueClosed)));

    // In-flight operation still runs to completion once unblocked
    gate.add_permits(3);
    let mut tickets = tickets.into_iter();
    let first = tickets.next().unwrap();
    first.wait().await.expect("in-flight operation should finish");

    // Queued-but-not-started operations were discarded
    for ticket in tickets {
        assert!(matches!(ticket.wait().await, Err(SyncError::QueueClosed)));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(queue.is_idle().await);
}

#[tokio::test]
async fn test_add_during_drain_is_pure_append() {
    common::setup_logging();

    let queue = Arc::new(BatchMutationQueue::new(BatchConfig {
        max_round_size: 2,
        round_pause_ms: 10,
        max_queue_size: 1000,
    }));
    let completed = Arc::new(AtomicUsize::new(0));

    // First batch kicks the queue from idle into draining
    let mut tickets = Vec::new();
    for _ in 0..2 {
        let completed = completed.clone();
        tickets.push(
            queue
                .add(async move {
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap(),
        );
    }

    // Appended while the first round drains; picked up by a later round
    tokio::time::sleep(Duration::from_millis(2)).await;
    for _ in 0..2 {
        let completed = completed.clone();
        tickets.push(
            queue
                .add(async move {
                    completed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap(),
        );
    }

    for ticket in tickets {
        ticket.wait().await.expect("operation should resolve");
    }
    assert_eq!(completed.load(Ordering::SeqCst), 4);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(queue.is_idle().await);
}
