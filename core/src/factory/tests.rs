//! Integration tests for the Factory module

use super::*;
use crate::channel::{report_channel, ChannelConfig, ReportReceiver};
use crate::config::LineConfig;
use crate::error::{Error, ReportKind};
use crate::pool::WorkPool;
use crate::report::Report;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Helpers
// ============================================================================

fn drain(rx: &mut ReportReceiver) -> Vec<Report> {
    let mut reports = Vec::new();
    while let Ok(report) = rx.try_recv() {
        reports.push(report);
    }
    reports
}

fn factory(id: usize, capacity: usize, pool: &Arc<WorkPool>, tx: &mpsc::Sender<Report>) -> Factory {
    FactoryBuilder::new(id)
        .line(LineConfig::new(capacity, 500))
        .pool(Arc::clone(pool))
        .report_tx(tx.clone())
        .build()
        .expect("valid factory")
}

// ============================================================================
// Single line
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_single_line_makes_whole_order() {
    let pool = Arc::new(WorkPool::new(30, 1));
    let (tx, mut rx) = report_channel(&ChannelConfig::default()).unwrap();

    let stats = factory(1, 10, &pool, &tx).run().await.expect("run failed");

    assert_eq!(stats.parts_made, 30);
    assert_eq!(stats.batches, 3);
    assert_eq!(stats.state, FactoryState::Done);

    let reports = drain(&mut rx);
    assert_eq!(reports.len(), 4);
    for report in &reports[..3] {
        match report {
            Report::Progress(p) => {
                assert_eq!(p.factory_id, 1);
                assert_eq!(p.units, 10);
                assert!((500..=501).contains(&p.batch_duration_ms));
            }
            other => panic!("expected progress, got {other:?}"),
        }
    }
    match &reports[3] {
        Report::Completion(c) => {
            assert_eq!(c.total_units, 30);
            assert_eq!(c.total_batches, 3);
        }
        other => panic!("expected completion, got {other:?}"),
    }

    let snap = pool.snapshot();
    assert_eq!(snap.made, 30);
    assert_eq!(snap.remaining, 0);
    assert_eq!(snap.active_factories, 0);
}

#[tokio::test(start_paused = true)]
async fn test_last_batch_is_partial() {
    let pool = Arc::new(WorkPool::new(25, 1));
    let (tx, mut rx) = report_channel(&ChannelConfig::default()).unwrap();

    factory(1, 10, &pool, &tx).run().await.unwrap();

    let units: Vec<usize> = drain(&mut rx)
        .into_iter()
        .filter_map(|r| match r {
            Report::Progress(p) => Some(p.units),
            Report::Completion(_) => None,
        })
        .collect();
    assert_eq!(units, vec![10, 10, 5]);
}

#[tokio::test(start_paused = true)]
async fn test_empty_order_sends_only_completion() {
    let pool = Arc::new(WorkPool::new(0, 2));
    let (tx, mut rx) = report_channel(&ChannelConfig::default()).unwrap();

    for id in 1..=2 {
        let stats = factory(id, 10, &pool, &tx).run().await.unwrap();
        assert_eq!(stats.parts_made, 0);
        assert_eq!(stats.batches, 0);
    }

    let reports = drain(&mut rx);
    assert_eq!(reports.len(), 2);
    for report in reports {
        match report {
            Report::Completion(c) => {
                assert_eq!(c.total_units, 0);
                assert_eq!(c.total_batches, 0);
            }
            other => panic!("expected completion only, got {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_duration_is_simulated() {
    let pool = Arc::new(WorkPool::new(20, 1));
    let (tx, _rx) = report_channel(&ChannelConfig::default()).unwrap();

    let factory = FactoryBuilder::new(1)
        .line(LineConfig::new(10, 1200))
        .pool(pool)
        .report_tx(tx)
        .build()
        .unwrap();

    let start = tokio::time::Instant::now();
    factory.run().await.unwrap();
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2400));
    assert!(elapsed < Duration::from_millis(2410));
}

// ============================================================================
// Delivery failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_closed_channel_fails_progress_delivery() {
    let pool = Arc::new(WorkPool::new(30, 1));
    let (tx, rx) = report_channel(&ChannelConfig::default()).unwrap();
    drop(rx);

    let err = factory(3, 10, &pool, &tx).run().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Delivery {
            factory_id: 3,
            kind: ReportKind::Progress
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_fails_completion_delivery() {
    let pool = Arc::new(WorkPool::new(0, 1));
    let (tx, rx) = report_channel(&ChannelConfig::default()).unwrap();
    drop(rx);

    let err = factory(1, 10, &pool, &tx).run().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Delivery {
            kind: ReportKind::Completion,
            ..
        }
    ));
    // A line that never delivered its completion is still counted as active
    assert_eq!(pool.snapshot().active_factories, 1);
}

#[tokio::test(start_paused = true)]
async fn test_full_channel_blocks_until_drained() {
    let pool = Arc::new(WorkPool::new(30, 1));
    let (tx, mut rx) = report_channel(&ChannelConfig::default().with_report_buffer(1)).unwrap();

    let handle = tokio::spawn(factory(1, 10, &pool, &tx).run());
    drop(tx);

    let mut received = Vec::new();
    while let Some(report) = rx.recv().await {
        received.push(report);
    }

    let stats = handle.await.unwrap().unwrap();
    assert_eq!(stats.parts_made, 30);
    assert_eq!(received.len(), 4);
    assert!(matches!(received.last(), Some(Report::Completion(_))));
}

// ============================================================================
// Concurrent lines
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_lines_conserve_work() {
    let pool = Arc::new(WorkPool::new(25, 3));
    let (tx, mut rx) = report_channel(&ChannelConfig::default()).unwrap();

    let handles: Vec<_> = (1..=3)
        .map(|id| tokio::spawn(factory(id, 10, &pool, &tx).run()))
        .collect();
    drop(tx);

    let watcher_pool = Arc::clone(&pool);
    let watcher = tokio::spawn(async move {
        loop {
            let snap = watcher_pool.snapshot();
            assert!(snap.is_conserved());
            if snap.active_factories == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    let mut progress_total = 0;
    let mut completions = Vec::new();
    while let Some(report) = rx.recv().await {
        match report {
            Report::Progress(p) => {
                assert!(p.units <= 10);
                progress_total += p.units;
            }
            Report::Completion(c) => completions.push(c.factory_id),
        }
    }

    let made: usize = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|h| h.unwrap().unwrap().parts_made)
        .sum();
    watcher.await.unwrap();

    completions.sort_unstable();
    assert_eq!(completions, vec![1, 2, 3]);
    assert_eq!(progress_total, 25);
    assert_eq!(made, 25);
    assert_eq!(pool.snapshot().made, 25);
}

#[tokio::test(start_paused = true)]
async fn test_reports_are_fifo_per_line() {
    let pool = Arc::new(WorkPool::new(200, 2));
    let (tx, mut rx) = report_channel(&ChannelConfig::default()).unwrap();

    let a = tokio::spawn(factory(1, 10, &pool, &tx).run());
    let b = tokio::spawn(factory(2, 50, &pool, &tx).run());
    drop(tx);

    let mut completed = [false, false];
    while let Some(report) = rx.recv().await {
        let idx = report.factory_id() - 1;
        assert!(!completed[idx], "report after completion from line {}", idx + 1);
        if matches!(report, Report::Completion(_)) {
            completed[idx] = true;
        }
    }

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();
    assert_eq!(completed, [true, true]);
}

#[test]
fn test_factory_debug_format() {
    let pool = Arc::new(WorkPool::new(10, 1));
    let (tx, _rx) = mpsc::channel(1);
    let debug = format!("{:?}", factory(5, 20, &pool, &tx));
    assert!(debug.contains("Factory"));
    assert!(debug.contains("capacity: 20"));
}
