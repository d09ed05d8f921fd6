//! Supervisor that aggregates factory reports
//!
//! The supervisor is the single consumer of the report channel. It keeps a
//! [`Ledger`] of per-line totals, counts completion reports down from the
//! number of lines, and on quorum runs its half of the end-of-run handshake:
//!
//! 1. Release the completion barrier
//! 2. Wait for the report gate
//! 3. Build the [`FinalReport`], checking the grand total against the order
//!
//! # Example
//!
//! ```ignore
//! use factory_line_core::supervisor::SupervisorBuilder;
//!
//! let supervisor = SupervisorBuilder::new(3)
//!     .report_rx(rx)
//!     .pool(pool)
//!     .barrier(barrier_release)
//!     .gate(gate_wait)
//!     .build()?;
//!
//! let report = supervisor.run().await?;
//! println!("{report}");
//! ```

mod builder;
mod executor;
mod ledger;
mod summary;

pub use builder::SupervisorBuilder;
pub use executor::Supervisor;
pub use ledger::{Applied, Ledger, LineTally};
pub use summary::{AccountingMismatch, CompletionDiscrepancy, FinalReport, ReportRow};
