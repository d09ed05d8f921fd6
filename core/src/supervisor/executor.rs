//! Supervisor receive loop and end-of-run handshake

use std::sync::Arc;

use crate::channel::ReportReceiver;
use crate::error::{Error, Result};
use crate::handshake::{Milestone, Release, Timeline, Wait};
use crate::pool::WorkPool;
use crate::report::Report;

use super::ledger::{Applied, Ledger};
use super::summary::FinalReport;

/// Supervisor consumes reports until every line has completed
///
/// The only exit from the receive loop is quorum: one completion report per
/// factory line. There is no timeout; a line that never completes keeps the
/// supervisor waiting until the orchestrator tears the run down.
pub struct Supervisor {
    /// Number of factory lines in the run
    factory_count: usize,

    /// Receiving half of the report channel
    report_rx: ReportReceiver,

    /// Work pool, read for the order size at report time
    pool: Arc<WorkPool>,

    /// Barrier released after quorum
    barrier: Release,

    /// Gate awaited before building the report
    gate: Wait,

    /// Handshake milestones shared with the orchestrator
    timeline: Timeline,
}

impl Supervisor {
    /// Create a new supervisor
    pub fn new(
        factory_count: usize,
        report_rx: ReportReceiver,
        pool: Arc<WorkPool>,
        barrier: Release,
        gate: Wait,
        timeline: Timeline,
    ) -> Self {
        Self {
            factory_count,
            report_rx,
            pool,
            barrier,
            gate,
            timeline,
        }
    }

    /// Run the supervisor to completion
    ///
    /// Returns the final report once the gate has opened.
    ///
    /// # Errors
    /// - [`Error::QuorumLost`] if every sender is gone before quorum
    /// - [`Error::Handshake`] if the orchestrator dropped its side of the
    ///   barrier or gate
    pub async fn run(self) -> Result<FinalReport> {
        let Self {
            factory_count,
            mut report_rx,
            pool,
            barrier,
            gate,
            timeline,
        } = self;

        let mut ledger = Ledger::new(factory_count);
        tracing::info!(factory_count, "Supervisor monitoring factory lines");

        while !ledger.is_quorum() {
            let Some(report) = report_rx.recv().await else {
                tracing::error!(
                    seen = ledger.completed(),
                    expected = factory_count,
                    "Report channel closed before quorum"
                );
                return Err(Error::QuorumLost {
                    seen: ledger.completed(),
                    expected: factory_count,
                });
            };
            log_report(&report, ledger.apply(&report));
        }
        report_rx.close();

        timeline.record(Milestone::QuorumReached);
        tracing::info!(
            grand_total = ledger.grand_total(),
            "All factory lines have completed"
        );

        timeline.record(Milestone::BarrierReleased);
        barrier.release()?;

        tracing::debug!("Waiting for permission to print the final report");
        gate.wait().await?;

        let report = FinalReport::from_ledger(&ledger, pool.order_size());
        timeline.record(Milestone::ReportGenerated);

        if let Some(anomaly) = &report.anomaly {
            tracing::warn!(
                expected = anomaly.expected,
                actual = anomaly.actual,
                "Accounting mismatch in final report"
            );
        }
        for discrepancy in &report.discrepancies {
            tracing::warn!(
                factory_id = discrepancy.factory_id,
                reported = discrepancy.reported,
                tallied = discrepancy.tallied,
                "Completion total disagrees with progress reports"
            );
        }

        for row in &report.rows {
            tracing::info!(
                factory_id = row.factory_id,
                total_parts = row.total_parts,
                total_batches = row.total_batches,
                "Final report row"
            );
        }
        tracing::info!(
            grand_total = report.grand_total,
            order_size = report.order_size,
            "Final report"
        );

        Ok(report)
    }

    /// Number of lines this supervisor waits for
    pub fn factory_count(&self) -> usize {
        self.factory_count
    }
}

fn log_report(report: &Report, applied: Applied) {
    match (report, applied) {
        (Report::Progress(p), Applied::Progress) => tracing::info!(
            factory_id = p.factory_id,
            units = p.units,
            batch_duration_ms = p.batch_duration_ms,
            "Factory produced parts"
        ),
        (Report::Completion(c), Applied::Completed) => tracing::info!(
            factory_id = c.factory_id,
            total_units = c.total_units,
            total_batches = c.total_batches,
            "Factory terminated"
        ),
        (_, Applied::DuplicateCompletion) => tracing::warn!(
            factory_id = report.factory_id(),
            "Ignoring duplicate completion report"
        ),
        (_, Applied::UnknownFactory) => tracing::warn!(
            factory_id = report.factory_id(),
            "Ignoring report from unknown factory line"
        ),
        _ => {}
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("factory_count", &self.factory_count)
            .field("order_size", &self.pool.order_size())
            .finish()
    }
}
