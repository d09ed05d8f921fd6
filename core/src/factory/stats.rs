//! Factory line running totals and lifecycle state

use serde::Serialize;
use tokio::time::Instant;

/// Lifecycle of a factory line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactoryState {
    /// Built but not yet running
    #[default]
    Starting,
    /// Claiming and making batches
    Producing,
    /// The pool returned zero on a claim
    Drained,
    /// Sending the completion report
    ReportingCompletion,
    /// Completion delivered, line exited
    Done,
}

/// Statistics tracked by each factory line
#[derive(Debug, Default, Clone)]
pub struct FactoryStats {
    /// Line identifier (1-based)
    pub factory_id: usize,

    /// Parts made over the line's lifetime
    pub parts_made: usize,

    /// Batches made over the line's lifetime
    pub batches: usize,

    /// Current lifecycle state
    pub state: FactoryState,

    /// Line start time
    pub started_at: Option<Instant>,

    /// Line end time
    pub ended_at: Option<Instant>,
}

impl FactoryStats {
    /// Create new empty stats for a line
    pub fn new(factory_id: usize) -> Self {
        Self {
            factory_id,
            ..Default::default()
        }
    }

    /// Start tracking (records start time)
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Stop tracking (records end time)
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Move to the next lifecycle state
    pub fn transition(&mut self, next: FactoryState) {
        tracing::trace!(
            factory_id = self.factory_id,
            from = ?self.state,
            to = ?next,
            "Factory state"
        );
        self.state = next;
    }

    /// Record one finished batch
    pub fn record_batch(&mut self, units: usize) {
        self.parts_made += units;
        self.batches += 1;
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Average parts per batch
    pub fn average_batch(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.parts_made as f64 / self.batches as f64
        }
    }
}
