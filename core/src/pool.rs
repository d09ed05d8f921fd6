//! Shared work pool that factory lines claim batches from
//!
//! The pool is the only state mutated by more than one unit. Every mutation
//! happens under a single `parking_lot` mutex that is held for O(1) work and
//! never across an await point or a nested acquisition.

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{Error, Result};

/// Consistent copy of the pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Parts in the order
    pub order_size: usize,
    /// Parts made and recorded
    pub made: usize,
    /// Parts claimed but not yet recorded
    pub in_flight: usize,
    /// Parts not yet claimed
    pub remaining: usize,
    /// Lines that have not finished yet
    pub active_factories: usize,
}

impl PoolSnapshot {
    /// `made + in_flight + remaining == order_size`
    pub fn is_conserved(&self) -> bool {
        self.made + self.in_flight + self.remaining == self.order_size
    }
}

#[derive(Debug)]
struct PoolState {
    made: usize,
    in_flight: usize,
    remaining: usize,
    active_factories: usize,
}

/// Remaining-work counter shared by all factory lines
#[derive(Debug)]
pub struct WorkPool {
    order_size: usize,
    state: Mutex<PoolState>,
}

impl WorkPool {
    /// Create a pool for `order_size` parts worked by `factory_count` lines
    pub fn new(order_size: usize, factory_count: usize) -> Self {
        Self {
            order_size,
            state: Mutex::new(PoolState {
                made: 0,
                in_flight: 0,
                remaining: order_size,
                active_factories: factory_count,
            }),
        }
    }

    /// Order size the pool was created with
    pub fn order_size(&self) -> usize {
        self.order_size
    }

    /// Claim up to `requested` parts
    ///
    /// Returns the number granted, `min(requested, remaining)`. Zero means the
    /// pool is drained and the caller should stop producing.
    pub fn claim(&self, requested: usize) -> usize {
        let mut state = self.state.lock();
        let granted = requested.min(state.remaining);
        state.remaining -= granted;
        state.in_flight += granted;
        granted
    }

    /// Record `units` previously claimed parts as made
    ///
    /// # Errors
    /// Returns [`Error::Accounting`] if more parts are recorded than are
    /// currently claimed, leaving the counters untouched.
    pub fn record_made(&self, units: usize) -> Result<()> {
        let mut state = self.state.lock();
        if units > state.in_flight {
            return Err(Error::Accounting(format!(
                "recorded {units} parts with only {} in flight",
                state.in_flight
            )));
        }
        state.in_flight -= units;
        state.made += units;
        Ok(())
    }

    /// Mark one line as finished
    pub fn factory_finished(&self) {
        let mut state = self.state.lock();
        state.active_factories = state.active_factories.saturating_sub(1);
    }

    /// Read all counters under one lock acquisition
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.state.lock();
        PoolSnapshot {
            order_size: self.order_size,
            made: state.made,
            in_flight: state.in_flight,
            remaining: state.remaining,
            active_factories: state.active_factories,
        }
    }
}
