//! Per-line accumulation of reports

use std::collections::BTreeMap;

use serde::Serialize;

use crate::report::{CompletionReport, ProgressReport, Report};

/// Totals for one factory line, as seen by the supervisor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineTally {
    /// Parts reported through progress reports
    pub total_parts: usize,
    /// Progress reports received
    pub total_batches: usize,
    /// Whether the line's completion report arrived
    pub done: bool,
    /// Parts the line claimed in its completion report
    pub reported_total: Option<usize>,
}

/// What a report did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Progress added to a line's totals
    Progress,
    /// A line completed; the countdown moved
    Completed,
    /// Second completion from the same line; ignored
    DuplicateCompletion,
    /// Report from an id outside `1..=expected`; ignored
    UnknownFactory,
}

/// Tallies keyed by factory id plus the completion countdown
///
/// Entries are created on a line's first report and never removed. The
/// countdown starts at the number of lines and only moves on the first
/// completion from each known line.
#[derive(Debug, Clone)]
pub struct Ledger {
    lines: BTreeMap<usize, LineTally>,
    expected: usize,
    outstanding: usize,
}

impl Ledger {
    /// Create a ledger expecting `factory_count` completions
    pub fn new(factory_count: usize) -> Self {
        Self {
            lines: BTreeMap::new(),
            expected: factory_count,
            outstanding: factory_count,
        }
    }

    /// Fold one report into the ledger
    pub fn apply(&mut self, report: &Report) -> Applied {
        let id = report.factory_id();
        if id == 0 || id > self.expected {
            return Applied::UnknownFactory;
        }

        match report {
            Report::Progress(p) => self.apply_progress(p),
            Report::Completion(c) => self.apply_completion(c),
        }
    }

    fn apply_progress(&mut self, progress: &ProgressReport) -> Applied {
        let tally = self.lines.entry(progress.factory_id).or_default();
        tally.total_parts += progress.units;
        tally.total_batches += 1;
        Applied::Progress
    }

    fn apply_completion(&mut self, completion: &CompletionReport) -> Applied {
        let tally = self.lines.entry(completion.factory_id).or_default();
        if tally.done {
            return Applied::DuplicateCompletion;
        }
        tally.done = true;
        tally.reported_total = Some(completion.total_units);
        self.outstanding -= 1;
        Applied::Completed
    }

    /// Every line has completed
    pub fn is_quorum(&self) -> bool {
        self.outstanding == 0
    }

    /// Completions still missing
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Completions received
    pub fn completed(&self) -> usize {
        self.expected - self.outstanding
    }

    /// Number of lines in the run
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Sum of parts across all lines
    pub fn grand_total(&self) -> usize {
        self.lines.values().map(|t| t.total_parts).sum()
    }

    /// Tallies in ascending id order
    pub fn lines(&self) -> impl Iterator<Item = (usize, &LineTally)> {
        self.lines.iter().map(|(id, tally)| (*id, tally))
    }

    /// Tally for one line
    pub fn line(&self, factory_id: usize) -> Option<&LineTally> {
        self.lines.get(&factory_id)
    }
}
