//! Result of a completed run

use serde::Serialize;

use crate::factory::FactoryStats;
use crate::handshake::Milestone;
use crate::pool::PoolSnapshot;
use crate::supervisor::FinalReport;

/// Everything a clean run produces
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Final report built by the supervisor
    pub report: FinalReport,

    /// Per-line stats in ascending id order
    #[serde(skip)]
    pub factories: Vec<FactoryStats>,

    /// Pool counters at teardown
    pub pool: PoolSnapshot,

    /// Handshake milestones in the order they were recorded
    pub timeline: Vec<Milestone>,
}

impl RunOutcome {
    /// Parts made according to the pool, independent of the reports
    pub fn parts_made(&self) -> usize {
        self.pool.made
    }

    /// Whether `first` was recorded before `second`
    pub fn happened_before(&self, first: Milestone, second: Milestone) -> bool {
        let pos = |m| self.timeline.iter().position(|x| *x == m);
        matches!((pos(first), pos(second)), (Some(a), Some(b)) if a < b)
    }
}
