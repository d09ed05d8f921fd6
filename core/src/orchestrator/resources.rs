//! Lifecycle of the shared resources owned by one run
//!
//! [`RunResources`] is created when the orchestrator starts a run and owns
//! everything the orchestrator must release: the work pool, its halves of
//! the two handshake signals, and the join handles of every spawned unit.
//! [`RunResources::teardown`] releases all of it exactly once. It is called
//! explicitly on the normal and interrupt paths and again from `Drop`, so a
//! run future dropped mid-flight still aborts its units.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::factory::FactoryStats;
use crate::handshake::{Release, Wait};
use crate::pool::{PoolSnapshot, WorkPool};
use crate::supervisor::FinalReport;

/// What a spawned unit hands back when it finishes
#[derive(Debug)]
pub enum UnitOutput {
    /// A factory line's final stats
    Factory(FactoryStats),
    /// The supervisor's final report
    Supervisor(FinalReport),
}

/// A spawned unit and its handle
pub(crate) struct Unit {
    pub(crate) name: String,
    pub(crate) handle: JoinHandle<Result<UnitOutput>>,
}

/// Shared resources of one run, released exactly once
pub struct RunResources {
    pool: Option<Arc<WorkPool>>,
    barrier: Option<Wait>,
    gate: Option<Release>,
    units: Vec<Unit>,
    torn_down: bool,
}

impl RunResources {
    /// Take ownership of the run's pool and the orchestrator's handshake halves
    pub fn new(pool: Arc<WorkPool>, barrier: Wait, gate: Release) -> Self {
        Self {
            pool: Some(pool),
            barrier: Some(barrier),
            gate: Some(gate),
            units: Vec::new(),
            torn_down: false,
        }
    }

    /// Track a spawned unit
    pub(crate) fn push_unit(&mut self, name: String, handle: JoinHandle<Result<UnitOutput>>) {
        self.units.push(Unit { name, handle });
    }

    /// Number of units still tracked
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Take the barrier's waiting half
    pub fn take_barrier(&mut self) -> Result<Wait> {
        self.barrier
            .take()
            .ok_or_else(|| Error::Handshake("completion barrier already awaited".into()))
    }

    /// Take the gate's releasing half
    pub fn take_gate(&mut self) -> Result<Release> {
        self.gate
            .take()
            .ok_or_else(|| Error::Handshake("report gate already released".into()))
    }

    /// Current pool counters, if the pool has not been released
    pub fn pool_snapshot(&self) -> Option<PoolSnapshot> {
        self.pool.as_ref().map(|pool| pool.snapshot())
    }

    /// Forcibly terminate every unit that is still running
    pub fn abort_all(&self) {
        for unit in &self.units {
            if !unit.handle.is_finished() {
                tracing::warn!(unit = %unit.name, "Terminating unit");
                unit.handle.abort();
            }
        }
    }

    /// Wait for every tracked unit to finish, in spawn order
    ///
    /// Units are removed as they are joined, so if this future is dropped
    /// part-way the remaining units are still tracked for teardown.
    pub(crate) async fn join_all(&mut self) -> Vec<(String, Result<UnitOutput>)> {
        let mut results = Vec::with_capacity(self.units.len());
        while let Some(unit) = self.units.first_mut() {
            let joined = (&mut unit.handle).await;
            let unit = self.units.remove(0);
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(Error::UnitPanicked {
                    unit: unit.name.clone(),
                    reason: e.to_string(),
                }),
            };
            results.push((unit.name, result));
        }
        results
    }

    /// Whether teardown already ran
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Release every shared resource
    ///
    /// Returns `true` the first time and `false` on every later call, which
    /// does nothing.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;

        self.abort_all();
        self.units.clear();
        self.barrier.take();
        self.gate.take();

        if let Some(pool) = self.pool.take() {
            let snap = pool.snapshot();
            tracing::debug!(
                made = snap.made,
                remaining = snap.remaining,
                active_factories = snap.active_factories,
                "Releasing work pool"
            );
        }

        tracing::info!("Shared resources released");
        true
    }
}

impl Drop for RunResources {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for RunResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunResources")
            .field("units", &self.units.len())
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
