//! Report channel between factory lines and the supervisor

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::report::Report;

/// Channel buffer configuration for the report channel
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Report channel buffer size (factories -> supervisor)
    pub report_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            report_buffer: 1024,
        }
    }
}

impl ChannelConfig {
    /// Create a new channel config with a custom report buffer size
    pub fn with_report_buffer(mut self, size: usize) -> Self {
        self.report_buffer = size;
        self
    }
}

/// Sending half, cloned once per factory line
pub type ReportSender = mpsc::Sender<Report>;

/// Receiving half, owned by the supervisor
pub type ReportReceiver = mpsc::Receiver<Report>;

/// Create the bounded report channel
///
/// A zero-sized buffer cannot back a bounded channel and is reported as a
/// resource acquisition failure rather than a panic.
pub fn report_channel(config: &ChannelConfig) -> Result<(ReportSender, ReportReceiver)> {
    if config.report_buffer == 0 {
        return Err(Error::resource("report channel buffer must be non-zero"));
    }
    Ok(mpsc::channel(config.report_buffer))
}
