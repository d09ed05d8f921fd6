//! Builder pattern for Supervisor construction

use std::sync::Arc;

use crate::channel::ReportReceiver;
use crate::config::{ConfigError, MAX_FACTORIES};
use crate::error::{Error, Result};
use crate::handshake::{Release, Timeline, Wait};
use crate::pool::WorkPool;

use super::executor::Supervisor;

/// Builder for creating a Supervisor
///
/// # Example
/// ```ignore
/// let supervisor = SupervisorBuilder::new(3)
///     .report_rx(rx)
///     .pool(pool)
///     .barrier(barrier_release)
///     .gate(gate_wait)
///     .build()?;
/// ```
pub struct SupervisorBuilder {
    factory_count: usize,
    report_rx: Option<ReportReceiver>,
    pool: Option<Arc<WorkPool>>,
    barrier: Option<Release>,
    gate: Option<Wait>,
    timeline: Timeline,
}

impl SupervisorBuilder {
    /// Create a builder for a run with `factory_count` lines
    pub fn new(factory_count: usize) -> Self {
        Self {
            factory_count,
            report_rx: None,
            pool: None,
            barrier: None,
            gate: None,
            timeline: Timeline::new(),
        }
    }

    /// Set the report channel receiver
    pub fn report_rx(mut self, rx: ReportReceiver) -> Self {
        self.report_rx = Some(rx);
        self
    }

    /// Set the work pool
    pub fn pool(mut self, pool: Arc<WorkPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the releasing half of the completion barrier
    pub fn barrier(mut self, barrier: Release) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// Set the waiting half of the report gate
    pub fn gate(mut self, gate: Wait) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Share a handshake timeline with the orchestrator
    pub fn timeline(mut self, timeline: Timeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Build the Supervisor
    ///
    /// # Errors
    /// Returns a configuration error if a required field is missing or the
    /// line count is outside `1..=MAX_FACTORIES`.
    pub fn build(self) -> Result<Supervisor> {
        if self.factory_count == 0 || self.factory_count > MAX_FACTORIES {
            return Err(ConfigError::InvalidFactoryCount(self.factory_count).into());
        }

        let report_rx = self
            .report_rx
            .ok_or_else(|| Error::missing_config("report_rx"))?;
        let pool = self.pool.ok_or_else(|| Error::missing_config("pool"))?;
        let barrier = self
            .barrier
            .ok_or_else(|| Error::missing_config("barrier"))?;
        let gate = self.gate.ok_or_else(|| Error::missing_config("gate"))?;

        Ok(Supervisor::new(
            self.factory_count,
            report_rx,
            pool,
            barrier,
            gate,
            self.timeline,
        ))
    }
}
