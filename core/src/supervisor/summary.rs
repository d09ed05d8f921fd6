//! Final report built by the supervisor once the gate opens

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ledger::Ledger;

/// One row of the final report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    /// Factory line (1-based)
    pub factory_id: usize,
    /// Parts the line made
    pub total_parts: usize,
    /// Batches the line made
    pub total_batches: usize,
}

/// Grand total disagrees with the order size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("grand total {actual} does not match order size {expected}")]
pub struct AccountingMismatch {
    /// Order size held by the work pool
    pub expected: usize,
    /// Sum of all progress reports
    pub actual: usize,
}

/// A line's completion total disagrees with its progress reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("factory {factory_id} reported {reported} parts but progress adds up to {tallied}")]
pub struct CompletionDiscrepancy {
    /// Factory line
    pub factory_id: usize,
    /// Total carried by the completion report
    pub reported: usize,
    /// Total from the line's progress reports
    pub tallied: usize,
}

/// Final production report
#[derive(Debug, Clone, Serialize)]
pub struct FinalReport {
    /// Per-line rows in ascending id order
    pub rows: Vec<ReportRow>,

    /// Sum of parts across all lines
    pub grand_total: usize,

    /// Parts in the order
    pub order_size: usize,

    /// Set when `grand_total != order_size`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AccountingMismatch>,

    /// Lines whose completion totals disagree with their progress
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub discrepancies: Vec<CompletionDiscrepancy>,

    /// When the report was built
    pub generated_at: DateTime<Utc>,
}

impl FinalReport {
    /// Build the report from a ledger that has reached quorum
    pub fn from_ledger(ledger: &Ledger, order_size: usize) -> Self {
        let rows: Vec<ReportRow> = ledger
            .lines()
            .map(|(factory_id, tally)| ReportRow {
                factory_id,
                total_parts: tally.total_parts,
                total_batches: tally.total_batches,
            })
            .collect();

        let grand_total = ledger.grand_total();
        let anomaly = (grand_total != order_size).then_some(AccountingMismatch {
            expected: order_size,
            actual: grand_total,
        });

        let discrepancies = ledger
            .lines()
            .filter_map(|(factory_id, tally)| {
                let reported = tally.reported_total?;
                (reported != tally.total_parts).then_some(CompletionDiscrepancy {
                    factory_id,
                    reported,
                    tallied: tally.total_parts,
                })
            })
            .collect();

        Self {
            rows,
            grand_total,
            order_size,
            anomaly,
            discrepancies,
            generated_at: Utc::now(),
        }
    }

    /// Whether the report shows any accounting problem
    pub fn is_clean(&self) -> bool {
        self.anomaly.is_none() && self.discrepancies.is_empty()
    }

    /// Total number of batches across all lines
    pub fn total_batches(&self) -> usize {
        self.rows.iter().map(|r| r.total_batches).sum()
    }
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Manufacturing Statistics:")?;
        writeln!(f, "=====================================")?;
        for row in &self.rows {
            writeln!(
                f,
                "Factory #{:3}: made {:5} parts in {:4} iterations",
                row.factory_id, row.total_parts, row.total_batches
            )?;
        }
        writeln!(f, "=====================================")?;
        write!(
            f,
            "Grand total: {} parts (order size: {})",
            self.grand_total, self.order_size
        )?;
        if let Some(anomaly) = &self.anomaly {
            write!(f, "\nWARNING: {anomaly}")?;
        }
        for discrepancy in &self.discrepancies {
            write!(f, "\nWARNING: {discrepancy}")?;
        }
        Ok(())
    }
}
