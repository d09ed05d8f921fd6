//! Messages carried from factory lines to the supervisor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finished batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Reporting factory line (1-based)
    pub factory_id: usize,
    /// Parts made in this batch, always non-zero
    pub units: usize,
    /// Simulated time the batch took, in milliseconds
    pub batch_duration_ms: u64,
    /// Wall-clock time the batch finished
    pub completed_at: DateTime<Utc>,
}

/// Terminal report, exactly one per factory line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Reporting factory line (1-based)
    pub factory_id: usize,
    /// Parts made over the line's lifetime
    pub total_units: usize,
    /// Batches made over the line's lifetime
    pub total_batches: usize,
}

/// Tagged message on the report channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    /// A batch finished
    Progress(ProgressReport),
    /// A line drained the pool and stopped
    Completion(CompletionReport),
}

impl Report {
    /// Factory line that sent this report
    pub fn factory_id(&self) -> usize {
        match self {
            Report::Progress(p) => p.factory_id,
            Report::Completion(c) => c.factory_id,
        }
    }
}
