//! One-shot handshake signals between supervisor and orchestrator
//!
//! Two single-use signals order the end of a run:
//!
//! - the **completion barrier**, released by the supervisor once every
//!   factory has completed and awaited by the orchestrator;
//! - the **report gate**, released by the orchestrator after its status
//!   check and awaited by the supervisor before it builds the final report.
//!
//! Both halves are consumed on use, so a signal can be released at most once
//! and awaited at most once. Which role holds which half is a protocol rule:
//! only the supervisor ever receives a barrier [`Release`], only the
//! orchestrator ever receives a gate [`Release`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Releasing half of a one-shot signal
#[derive(Debug)]
pub struct Release {
    name: &'static str,
    tx: oneshot::Sender<()>,
}

impl Release {
    /// Release the signal
    ///
    /// # Errors
    /// Returns [`Error::Handshake`] if the waiting half was already dropped.
    pub fn release(self) -> Result<()> {
        self.tx
            .send(())
            .map_err(|_| Error::Handshake(format!("{} has no waiter", self.name)))
    }

    /// Signal name, for logging
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Waiting half of a one-shot signal
#[derive(Debug)]
pub struct Wait {
    name: &'static str,
    rx: oneshot::Receiver<()>,
}

impl Wait {
    /// Suspend until the signal is released
    ///
    /// # Errors
    /// Returns [`Error::Handshake`] if the releasing half was dropped without
    /// releasing.
    pub async fn wait(self) -> Result<()> {
        self.rx
            .await
            .map_err(|_| Error::Handshake(format!("{} dropped before release", self.name)))
    }

    /// Signal name, for logging
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn signal(name: &'static str) -> (Release, Wait) {
    let (tx, rx) = oneshot::channel();
    (Release { name, tx }, Wait { name, rx })
}

/// Create the barrier the supervisor releases after quorum
pub fn completion_barrier() -> (Release, Wait) {
    signal("completion barrier")
}

/// Create the gate the orchestrator releases after its status check
pub fn report_gate() -> (Release, Wait) {
    signal("report gate")
}

/// Points in the end-of-run handshake, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// Supervisor observed the last completion report
    QuorumReached,
    /// Supervisor released the completion barrier
    BarrierReleased,
    /// Orchestrator returned from its barrier wait
    BarrierObserved,
    /// Orchestrator finished its status check
    StatusChecked,
    /// Orchestrator released the report gate
    GateReleased,
    /// Supervisor built the final report
    ReportGenerated,
}

/// Append-only record of milestones, shared by supervisor and orchestrator
///
/// Each side records a milestone before the release that publishes it, so the
/// recorded order follows the happens-before order of the handshake.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    inner: Arc<Mutex<Vec<Milestone>>>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a milestone
    pub fn record(&self, milestone: Milestone) {
        tracing::trace!(?milestone, "Handshake milestone");
        self.inner.lock().push(milestone);
    }

    /// Milestones recorded so far, in order
    pub fn milestones(&self) -> Vec<Milestone> {
        self.inner.lock().clone()
    }

    /// Position of the first occurrence of `milestone`
    pub fn position(&self, milestone: Milestone) -> Option<usize> {
        self.inner.lock().iter().position(|m| *m == milestone)
    }
}
