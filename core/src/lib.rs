//! factory-line-core: Coordination core for the factory-line simulator
//!
//! A fixed set of factory lines claims batches from one shared work pool,
//! simulates making them, and reports to a single supervisor over a bounded
//! channel. This crate provides:
//!
//! - The shared work pool and the report channel
//! - Factory lines and the supervisor that tallies their reports
//! - The two one-shot handshake signals that order the end of a run
//! - The orchestrator that owns a run's lifecycle and teardown
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod factory;
pub mod handshake;
pub mod orchestrator;
pub mod pool;
pub mod report;
pub mod supervisor;
pub mod traits;

pub use channel::{report_channel, ChannelConfig, ReportReceiver, ReportSender};
pub use config::{
    ConfigError, LineConfig, LinePlan, RunConfig, DEFAULT_STATUS_CHECK_MS, MAX_FACTORIES,
};
pub use error::*;
pub use factory::{Factory, FactoryBuilder, FactoryState, FactoryStats};
pub use handshake::{completion_barrier, report_gate, Milestone, Release, Timeline, Wait};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, RunOutcome, RunResources};
pub use pool::{PoolSnapshot, WorkPool};
pub use report::*;
pub use supervisor::{FinalReport, Supervisor, SupervisorBuilder};
pub use traits::*;

#[cfg(test)]
mod integration_tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    // =========================================================================
    // Whole-run properties
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_seeded_run_conserves_work() {
        let orchestrator = OrchestratorBuilder::new()
            .factory_count(MAX_FACTORIES)
            .order_size(997)
            .line_plan(LinePlan::Seeded(2024))
            .status_check_duration(Duration::from_millis(10))
            .build()
            .unwrap();

        let outcome = orchestrator.run().await.unwrap();

        assert_eq!(outcome.report.rows.len(), MAX_FACTORIES);
        assert_eq!(outcome.report.grand_total, 997);
        assert_eq!(outcome.parts_made(), 997);
        assert!(outcome.pool.is_conserved());
        for (stats, line) in outcome.factories.iter().zip(orchestrator.lines()) {
            let max_parts = stats.batches * line.capacity;
            assert!(stats.parts_made <= max_parts);
            assert_eq!(stats.state, FactoryState::Done);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_counts_match_factory_stats() {
        let orchestrator = OrchestratorBuilder::new()
            .factory_count(4)
            .order_size(123)
            .line_plan(LinePlan::Seeded(9))
            .status_check(Arc::new(PrinterCheck::new(Duration::ZERO)))
            .build()
            .unwrap();

        let outcome = orchestrator.run().await.unwrap();

        for (row, stats) in outcome.report.rows.iter().zip(&outcome.factories) {
            assert_eq!(row.factory_id, stats.factory_id);
            assert_eq!(row.total_parts, stats.parts_made);
            assert_eq!(row.total_batches, stats.batches);
        }
        let batches: usize = outcome.factories.iter().map(|s| s.batches).sum();
        assert_eq!(outcome.report.total_batches(), batches);
    }
}
