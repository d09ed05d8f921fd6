//! Builder pattern for Orchestrator construction

use std::sync::Arc;
use std::time::Duration;

use crate::channel::ChannelConfig;
use crate::config::{LinePlan, RunConfig};
use crate::error::Result;
use crate::traits::{PrinterCheck, StatusCheck};

use super::executor::Orchestrator;

/// Builder for creating an Orchestrator with validated configuration
///
/// # Example
///
/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .factory_count(3)
///     .order_size(25)
///     .line_plan(LinePlan::Seeded(7))
///     .build()?;
///
/// let outcome = orchestrator.run_with_signal_handling().await?;
/// ```
pub struct OrchestratorBuilder {
    config: RunConfig,
    line_plan: LinePlan,
    status_check: Option<Arc<dyn StatusCheck>>,
    channel_config: ChannelConfig,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder with default configuration
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            line_plan: LinePlan::default(),
            status_check: None,
            channel_config: ChannelConfig::default(),
        }
    }

    /// Set the full run configuration
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of factory lines
    pub fn factory_count(mut self, count: usize) -> Self {
        self.config.factory_count = count;
        self
    }

    /// Set the number of parts in the order
    pub fn order_size(mut self, size: usize) -> Self {
        self.config.order_size = size;
        self
    }

    /// Set how long the default printer check takes
    pub fn status_check_duration(mut self, duration: Duration) -> Self {
        self.config.status_check = duration;
        self
    }

    /// Set how line parameters are chosen
    pub fn line_plan(mut self, plan: LinePlan) -> Self {
        self.line_plan = plan;
        self
    }

    /// Replace the printer check with a custom status check
    pub fn status_check(mut self, check: Arc<dyn StatusCheck>) -> Self {
        self.status_check = Some(check);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Build the orchestrator
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the run configuration is invalid or
    /// the line plan does not yield one valid line per factory.
    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;
        let lines = self.line_plan.resolve(self.config.factory_count)?;

        let status_check = self
            .status_check
            .unwrap_or_else(|| Arc::new(PrinterCheck::new(self.config.status_check)));

        Ok(Orchestrator::new(
            self.config,
            lines,
            self.channel_config,
            status_check,
        ))
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
