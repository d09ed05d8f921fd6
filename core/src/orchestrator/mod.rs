//! Orchestrator for run lifecycle management
//!
//! The Orchestrator coordinates one production run:
//! - Creating the work pool, report channel and handshake signals
//! - Spawning the supervisor and every factory line
//! - Waiting on the completion barrier and opening the report gate
//! - Aborting units and releasing resources on interrupt or failure
//!
//! # Example
//!
//! ```ignore
//! use factory_line_core::{LinePlan, OrchestratorBuilder};
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .factory_count(3)
//!     .order_size(25)
//!     .line_plan(LinePlan::Seeded(7))
//!     .build()?;
//!
//! let outcome = orchestrator.run_with_signal_handling().await?;
//! println!("{}", outcome.report);
//! ```

mod builder;
mod executor;
mod outcome;
mod resources;

pub use builder::OrchestratorBuilder;
pub use executor::Orchestrator;
pub use outcome::RunOutcome;
pub use resources::{RunResources, UnitOutput};

#[cfg(test)]
mod tests;
