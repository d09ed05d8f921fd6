//! Core traits for orchestrator collaborators

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Status Check Trait
// ============================================================================

/// External check the orchestrator runs between the completion barrier and
/// the report gate
///
/// The check is a side effect, not a coordination primitive: it must not
/// touch the work pool, the report channel or either handshake signal.
#[async_trait]
pub trait StatusCheck: Send + Sync {
    /// Check identifier for logging
    fn name(&self) -> &str;

    /// Run the check to completion
    async fn check(&self) -> Result<()>;
}

/// Simulated printer status check that takes a fixed amount of time
#[derive(Debug, Clone)]
pub struct PrinterCheck {
    duration: Duration,
}

impl PrinterCheck {
    /// Create a check that takes `duration`
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// How long the check takes
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl StatusCheck for PrinterCheck {
    fn name(&self) -> &str {
        "printer"
    }

    async fn check(&self) -> Result<()> {
        tracing::debug!(duration_ms = self.duration.as_millis() as u64, "Checking printer status");
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}
