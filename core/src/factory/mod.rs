//! Factory lines that turn the order into parts
//!
//! A factory line is the producer in a run. Its loop is
//! **claim -> make -> record -> report -> repeat**:
//!
//! 1. Claim up to `capacity` parts from the shared WorkPool
//! 2. Stop when the claim returns zero
//! 3. Sleep for the line's fixed `duration` to simulate making the batch
//! 4. Record the batch as made in the WorkPool
//! 5. Send a progress report to the supervisor
//!
//! Once drained, the line sends exactly one completion report with its
//! running totals and exits.
//!
//! # Example
//!
//! ```ignore
//! use factory_line_core::factory::FactoryBuilder;
//! use factory_line_core::config::LineConfig;
//!
//! let factory = FactoryBuilder::new(1)
//!     .line(LineConfig::new(10, 500))
//!     .pool(pool)
//!     .report_tx(tx)
//!     .build()?;
//!
//! let stats = factory.run().await?;
//! println!("Made: {}", stats.parts_made);
//! ```

mod builder;
mod executor;
mod stats;

pub use builder::FactoryBuilder;
pub use executor::Factory;
pub use stats::{FactoryState, FactoryStats};

#[cfg(test)]
mod tests;
