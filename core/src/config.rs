//! Run and factory line configuration types

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of factory lines in one run
pub const MAX_FACTORIES: usize = 20;

/// Accepted per-batch capacity of a factory line (parts)
pub const CAPACITY_RANGE: RangeInclusive<usize> = 10..=50;

/// Accepted simulated batch duration of a factory line (milliseconds)
pub const DURATION_MS_RANGE: RangeInclusive<u64> = 500..=1200;

/// Default length of the simulated printer status check, in milliseconds
pub const DEFAULT_STATUS_CHECK_MS: u64 = 2000;

/// Default length of the simulated printer status check
pub const DEFAULT_STATUS_CHECK: Duration = Duration::from_millis(DEFAULT_STATUS_CHECK_MS);

/// Run configuration owned by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of factory lines
    pub factory_count: usize,

    /// Total parts in the order
    pub order_size: usize,

    /// How long the status check between barrier and gate takes
    #[serde(with = "duration_ms")]
    pub status_check: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            factory_count: 1,
            order_size: 100,
            status_check: DEFAULT_STATUS_CHECK,
        }
    }
}

impl RunConfig {
    /// Create a new config for the given line count and order size
    pub fn new(factory_count: usize, order_size: usize) -> Self {
        Self {
            factory_count,
            order_size,
            ..Default::default()
        }
    }

    /// Set the status check duration
    pub fn with_status_check(mut self, status_check: Duration) -> Self {
        self.status_check = status_check;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factory_count == 0 || self.factory_count > MAX_FACTORIES {
            return Err(ConfigError::InvalidFactoryCount(self.factory_count));
        }

        if self.order_size == 0 {
            return Err(ConfigError::InvalidOrderSize(
                "order size must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// Per-line production parameters, fixed for the line's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineConfig {
    /// Maximum parts claimed per batch
    pub capacity: usize,

    /// Simulated time to make one batch
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl LineConfig {
    /// Create a line config from capacity and duration in milliseconds
    pub fn new(capacity: usize, duration_ms: u64) -> Self {
        Self {
            capacity,
            duration: Duration::from_millis(duration_ms),
        }
    }

    /// Sample a line config uniformly from the accepted ranges
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(
            rng.gen_range(CAPACITY_RANGE),
            rng.gen_range(DURATION_MS_RANGE),
        )
    }

    /// Validate against the accepted ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !CAPACITY_RANGE.contains(&self.capacity) {
            return Err(ConfigError::InvalidCapacity(self.capacity));
        }

        let ms = self.duration.as_millis();
        if ms < u128::from(*DURATION_MS_RANGE.start()) || ms > u128::from(*DURATION_MS_RANGE.end())
        {
            return Err(ConfigError::InvalidDuration(ms));
        }

        Ok(())
    }
}

/// How factory line parameters are chosen at launch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePlan {
    /// Sample every line from the thread RNG
    #[default]
    Random,
    /// Sample every line from an RNG seeded with the given value
    Seeded(u64),
    /// Use these configs, one per line in id order
    Explicit(Vec<LineConfig>),
}

impl LinePlan {
    /// Resolve the plan into one config per factory line
    pub fn resolve(&self, factory_count: usize) -> Result<Vec<LineConfig>, ConfigError> {
        let lines = match self {
            LinePlan::Random => {
                let mut rng = rand::thread_rng();
                (0..factory_count)
                    .map(|_| LineConfig::sample(&mut rng))
                    .collect()
            }
            LinePlan::Seeded(seed) => {
                let mut rng = StdRng::seed_from_u64(*seed);
                (0..factory_count)
                    .map(|_| LineConfig::sample(&mut rng))
                    .collect()
            }
            LinePlan::Explicit(lines) => {
                if lines.len() != factory_count {
                    return Err(ConfigError::LineCountMismatch {
                        expected: factory_count,
                        actual: lines.len(),
                    });
                }
                lines.clone()
            }
        };

        for line in &lines {
            line.validate()?;
        }
        Ok(lines)
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Factory count outside `1..=MAX_FACTORIES`
    #[error("factory count must be between 1 and {max}, got {0}", max = MAX_FACTORIES)]
    InvalidFactoryCount(usize),

    /// Order size rejected
    #[error("invalid order size: {0}")]
    InvalidOrderSize(String),

    /// Capacity outside the accepted range
    #[error("capacity must be between 10 and 50, got {0}")]
    InvalidCapacity(usize),

    /// Duration outside the accepted range
    #[error("duration must be between 500 and 1200 milliseconds, got {0}")]
    InvalidDuration(u128),

    /// Factory id outside `1..=factory_count`
    #[error("factory id {id} outside 1..={count}")]
    InvalidFactoryId {
        /// Offending id
        id: usize,
        /// Number of lines in the run
        count: usize,
    },

    /// Explicit line plan does not cover every line
    #[error("line plan has {actual} entries for {expected} factories")]
    LineCountMismatch {
        /// Lines in the run
        expected: usize,
        /// Entries supplied
        actual: usize,
    },

    /// Required builder field missing
    #[error("missing required field: {0}")]
    Missing(String),
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
