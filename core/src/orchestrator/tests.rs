//! Tests for the Orchestrator module

use super::builder::OrchestratorBuilder;
use super::executor::Orchestrator;
use crate::channel::ChannelConfig;
use crate::config::{ConfigError, LineConfig, LinePlan};
use crate::error::{Error, Result};
use crate::handshake::Milestone;
use crate::traits::StatusCheck;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Mock StatusCheck
// ============================================================================

struct MockCheck {
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl MockCheck {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Duration::ZERO)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusCheck for MockCheck {
    fn name(&self) -> &str {
        "mock"
    }

    async fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(Error::Io(std::io::Error::other("printer offline")));
        }
        Ok(())
    }
}

fn orchestrator(order_size: usize, capacities: &[usize], check: Arc<MockCheck>) -> Orchestrator {
    OrchestratorBuilder::new()
        .factory_count(capacities.len())
        .order_size(order_size)
        .line_plan(LinePlan::Explicit(
            capacities.iter().map(|c| LineConfig::new(*c, 500)).collect(),
        ))
        .status_check(check)
        .build()
        .expect("valid orchestrator")
}

// ============================================================================
// Builder Tests
// ============================================================================

#[test]
fn test_builder_rejects_empty_order() {
    let err = OrchestratorBuilder::new()
        .factory_count(2)
        .order_size(0)
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidOrderSize(_))
    ));
}

#[test]
fn test_builder_rejects_factory_count_out_of_range() {
    for count in [0, 21] {
        let err = OrchestratorBuilder::new()
            .factory_count(count)
            .order_size(10)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidFactoryCount(n)) if n == count
        ));
    }
}

#[test]
fn test_builder_rejects_plan_mismatch() {
    let err = OrchestratorBuilder::new()
        .factory_count(3)
        .order_size(10)
        .line_plan(LinePlan::Explicit(vec![LineConfig::new(10, 500)]))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::LineCountMismatch {
            expected: 3,
            actual: 1
        })
    ));
}

#[test]
fn test_builder_rejects_out_of_range_line() {
    let err = OrchestratorBuilder::new()
        .factory_count(1)
        .order_size(10)
        .line_plan(LinePlan::Explicit(vec![LineConfig::new(10, 2000)]))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidDuration(2000))
    ));
}

#[test]
fn test_builder_seeded_plan_is_reproducible() {
    let build = || {
        OrchestratorBuilder::new()
            .factory_count(5)
            .order_size(100)
            .line_plan(LinePlan::Seeded(42))
            .build()
            .unwrap()
    };
    let a = build();
    let b = build();
    assert_eq!(a.lines(), b.lines());
    assert_eq!(a.lines().len(), 5);
    assert!(a.lines().iter().all(|line| line.validate().is_ok()));
}

#[test]
fn test_orchestrator_debug_format() {
    let o = orchestrator(10, &[10, 20], Arc::new(MockCheck::new(Duration::ZERO)));
    let debug = format!("{o:?}");
    assert!(debug.contains("Orchestrator"));
    assert!(debug.contains("mock"));
    assert!(debug.contains("lines: 2"));
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_single_line_order_of_thirty() {
    let check = Arc::new(MockCheck::new(Duration::from_secs(2)));
    let o = orchestrator(30, &[10], Arc::clone(&check));

    let start = Instant::now();
    let outcome = o.run().await.expect("run failed");
    let elapsed = start.elapsed();

    assert_eq!(outcome.report.grand_total, 30);
    assert_eq!(outcome.report.rows.len(), 1);
    assert_eq!(outcome.report.rows[0].total_batches, 3);
    assert!(outcome.report.is_clean());

    assert_eq!(outcome.factories.len(), 1);
    assert_eq!(outcome.factories[0].parts_made, 30);
    assert_eq!(outcome.parts_made(), 30);
    assert_eq!(outcome.pool.remaining, 0);
    assert_eq!(outcome.pool.active_factories, 0);

    assert_eq!(check.calls(), 1);
    // Three batches of 500 ms plus the two second check
    assert!(elapsed >= Duration::from_millis(3500));
    assert!(elapsed < Duration::from_millis(3600));
}

#[tokio::test(start_paused = true)]
async fn test_three_lines_split_order_of_twenty_five() {
    let o = orchestrator(25, &[10, 10, 10], Arc::new(MockCheck::new(Duration::ZERO)));

    let outcome = o.run().await.expect("run failed");

    assert_eq!(outcome.report.grand_total, 25);
    assert!(outcome.report.is_clean());
    assert!(outcome.pool.is_conserved());
    assert_eq!(outcome.pool.in_flight, 0);

    let ids: Vec<usize> = outcome.factories.iter().map(|s| s.factory_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let made: usize = outcome.factories.iter().map(|s| s.parts_made).sum();
    assert_eq!(made, 25);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_milestones_in_order() {
    let o = orchestrator(40, &[10, 20], Arc::new(MockCheck::new(Duration::from_secs(2))));

    let outcome = o.run().await.unwrap();

    assert_eq!(
        outcome.timeline,
        vec![
            Milestone::QuorumReached,
            Milestone::BarrierReleased,
            Milestone::BarrierObserved,
            Milestone::StatusChecked,
            Milestone::GateReleased,
            Milestone::ReportGenerated,
        ]
    );
    assert!(outcome.happened_before(Milestone::StatusChecked, Milestone::ReportGenerated));
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_can_run_twice() {
    let o = orchestrator(20, &[10, 10], Arc::new(MockCheck::new(Duration::ZERO)));

    let first = o.run().await.unwrap();
    let second = o.run().await.unwrap();
    assert_eq!(first.report.grand_total, 20);
    assert_eq!(second.report.grand_total, 20);
}

#[tokio::test(start_paused = true)]
async fn test_zero_report_buffer_is_resource_error() {
    let o = OrchestratorBuilder::new()
        .factory_count(1)
        .order_size(10)
        .channel_config(ChannelConfig::default().with_report_buffer(0))
        .build()
        .unwrap();

    let err = o.run().await.unwrap_err();
    assert!(matches!(err, Error::ResourceAcquisition(_)));
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_check_tears_down() {
    let check = Arc::new(MockCheck::failing());
    let o = orchestrator(10, &[10], Arc::clone(&check));

    let err = o.run().await.unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(check.calls(), 1);
}

// ============================================================================
// Interrupts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_production() {
    let o = Arc::new(orchestrator(1000, &[10, 10], Arc::new(MockCheck::new(Duration::ZERO))));

    let runner = Arc::clone(&o);
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(1200)).await;
    o.shutdown();

    let err = handle.await.expect("run task panicked").unwrap_err();
    assert!(matches!(err, Error::Interrupted));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_status_check() {
    let check = Arc::new(MockCheck::new(Duration::from_secs(3600)));
    let o = Arc::new(orchestrator(10, &[10], Arc::clone(&check)));

    let runner = Arc::clone(&o);
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(check.calls(), 1);
    assert!(!handle.is_finished());

    o.shutdown();
    let err = handle.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Interrupted));
}

#[tokio::test(start_paused = true)]
async fn test_run_with_timeout_interrupts() {
    let o = orchestrator(1000, &[10], Arc::new(MockCheck::new(Duration::ZERO)));

    let start = Instant::now();
    let err = o
        .run_with_timeout(Duration::from_millis(1600))
        .await
        .unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, Error::Interrupted));
    assert!(elapsed >= Duration::from_millis(1600));
    assert!(elapsed < Duration::from_millis(1700));
}

#[tokio::test(start_paused = true)]
async fn test_run_with_timeout_after_completion() {
    let o = orchestrator(10, &[10], Arc::new(MockCheck::new(Duration::ZERO)));

    let outcome = o
        .run_with_timeout(Duration::from_secs(60))
        .await
        .expect("run finishes before the deadline");
    assert_eq!(outcome.report.grand_total, 10);
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_interrupts_before_first_batch() {
    let o = orchestrator(1000, &[10], Arc::new(MockCheck::new(Duration::ZERO)));

    let start = Instant::now();
    let err = o.run_with_timeout(Duration::ZERO).await.unwrap_err();

    assert!(matches!(err, Error::Interrupted));
    assert!(start.elapsed() < Duration::from_millis(500));
}
