//! Builder pattern for Factory construction

use crate::channel::ReportSender;
use crate::config::{ConfigError, LineConfig};
use crate::error::{Error, Result};
use crate::pool::WorkPool;

use super::executor::Factory;

use std::sync::Arc;

/// Builder for creating Factory instances
///
/// Validates the line parameters before any primitive is touched.
///
/// # Example
/// ```ignore
/// let factory = FactoryBuilder::new(1)
///     .line(LineConfig::new(10, 500))
///     .pool(pool)
///     .report_tx(tx)
///     .factory_count(3)
///     .build()?;
/// ```
pub struct FactoryBuilder {
    id: usize,
    line: Option<LineConfig>,
    pool: Option<Arc<WorkPool>>,
    report_tx: Option<ReportSender>,
    factory_count: Option<usize>,
}

impl FactoryBuilder {
    /// Create a new builder with the given line ID (1-based)
    pub fn new(id: usize) -> Self {
        Self {
            id,
            line: None,
            pool: None,
            report_tx: None,
            factory_count: None,
        }
    }

    /// Set the capacity and duration
    pub fn line(mut self, line: LineConfig) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the shared work pool
    pub fn pool(mut self, pool: Arc<WorkPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the report channel sender
    pub fn report_tx(mut self, tx: ReportSender) -> Self {
        self.report_tx = Some(tx);
        self
    }

    /// Set the number of lines in the run, used to bound the ID
    pub fn factory_count(mut self, count: usize) -> Self {
        self.factory_count = Some(count);
        self
    }

    /// Build the Factory
    ///
    /// # Errors
    /// Returns a configuration error if a required field is missing, the
    /// line parameters are out of range, or the ID is outside the run.
    pub fn build(self) -> Result<Factory> {
        let line = self.line.ok_or_else(|| Error::missing_config("line"))?;
        let pool = self.pool.ok_or_else(|| Error::missing_config("pool"))?;
        let report_tx = self
            .report_tx
            .ok_or_else(|| Error::missing_config("report_tx"))?;

        let count = self.factory_count.unwrap_or(usize::MAX);
        if self.id == 0 || self.id > count {
            return Err(ConfigError::InvalidFactoryId { id: self.id, count }.into());
        }

        line.validate()?;

        Ok(Factory::new(self.id, line, pool, report_tx))
    }
}
