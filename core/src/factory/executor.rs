//! Factory line production loop

use crate::channel::ReportSender;
use crate::config::LineConfig;
use crate::error::{Error, ReportKind, Result};
use crate::pool::WorkPool;
use crate::report::{CompletionReport, ProgressReport, Report};

use super::stats::{FactoryState, FactoryStats};

use std::sync::Arc;
use tokio::time::Instant;

/// Factory line: claim -> make -> record -> report -> repeat
///
/// Lines are independent tokio tasks spawned by the Orchestrator. They share
/// the WorkPool via Arc and report through their own clone of the report
/// channel sender.
pub struct Factory {
    /// Line identifier (1-based)
    id: usize,

    /// Capacity and duration, fixed for the line's lifetime
    line: LineConfig,

    /// Shared work pool
    pool: Arc<WorkPool>,

    /// Channel sender for progress and completion reports
    report_tx: ReportSender,
}

impl Factory {
    /// Create a new factory line
    pub fn new(id: usize, line: LineConfig, pool: Arc<WorkPool>, report_tx: ReportSender) -> Self {
        Self {
            id,
            line,
            pool,
            report_tx,
        }
    }

    /// Run the line until the pool is drained
    ///
    /// Sends one progress report per batch and exactly one completion report
    /// before returning. A report that cannot be delivered is returned as
    /// [`Error::Delivery`]; the supervisor depends on every completion, so
    /// the failure is never swallowed.
    pub async fn run(self) -> Result<FactoryStats> {
        let mut stats = FactoryStats::new(self.id);
        stats.start();
        stats.transition(FactoryState::Producing);

        tracing::debug!(
            factory_id = self.id,
            capacity = self.line.capacity,
            duration_ms = self.line.duration.as_millis() as u64,
            "Factory started"
        );

        loop {
            let units = self.pool.claim(self.line.capacity);
            if units == 0 {
                stats.transition(FactoryState::Drained);
                break;
            }

            tracing::info!(
                factory_id = self.id,
                units,
                duration_ms = self.line.duration.as_millis() as u64,
                "Going to make parts"
            );

            let batch_start = Instant::now();
            tokio::time::sleep(self.line.duration).await;
            self.pool.record_made(units)?;
            stats.record_batch(units);

            tracing::info!(factory_id = self.id, units, "Completed making parts");

            let progress = Report::Progress(ProgressReport {
                factory_id: self.id,
                units,
                batch_duration_ms: batch_start.elapsed().as_millis() as u64,
                completed_at: chrono::Utc::now(),
            });
            self.deliver(progress, ReportKind::Progress).await?;
        }

        tracing::info!(
            factory_id = self.id,
            parts_made = stats.parts_made,
            batches = stats.batches,
            "Factory line drained"
        );

        stats.transition(FactoryState::ReportingCompletion);
        let completion = Report::Completion(CompletionReport {
            factory_id: self.id,
            total_units: stats.parts_made,
            total_batches: stats.batches,
        });
        self.deliver(completion, ReportKind::Completion).await?;

        self.pool.factory_finished();
        stats.transition(FactoryState::Done);
        stats.stop();

        tracing::debug!(
            factory_id = self.id,
            elapsed_ms = ?stats.elapsed().map(|d| d.as_millis()),
            "Factory finished"
        );

        Ok(stats)
    }

    /// Hand a report to the supervisor, waiting while the channel is full
    async fn deliver(&self, report: Report, kind: ReportKind) -> Result<()> {
        self.report_tx.send(report).await.map_err(|_| {
            tracing::error!(factory_id = self.id, %kind, "Report channel closed");
            Error::delivery(self.id, kind)
        })
    }

    /// Get the line ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Get the line configuration
    pub fn line(&self) -> LineConfig {
        self.line
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("id", &self.id)
            .field("capacity", &self.line.capacity)
            .field("duration", &self.line.duration)
            .finish()
    }
}
