//! Error types for factory-line-core

use thiserror::Error;

use crate::config::ConfigError;

/// Which kind of report failed to reach the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Per-batch progress report
    Progress,
    /// Terminal completion report
    Completion,
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Progress => f.write_str("progress"),
            ReportKind::Completion => f.write_str("completion"),
        }
    }
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid counts, sizes or durations; raised before any coordination
    /// primitive exists
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A coordination primitive, runtime or log sink could not be created
    #[error("resource acquisition failed: {0}")]
    ResourceAcquisition(String),

    /// A report could not be handed to the supervisor
    #[error("factory {factory_id} failed to deliver {kind} report: supervisor channel closed")]
    Delivery {
        /// Originating factory line
        factory_id: usize,
        /// Report that was lost
        kind: ReportKind,
    },

    /// The report channel closed before every factory completed
    #[error("report channel closed after {seen} of {expected} completion reports")]
    QuorumLost {
        /// Completion reports observed
        seen: usize,
        /// Completion reports required
        expected: usize,
    },

    /// A barrier or gate was dropped on one side before it was used
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// WorkPool accounting was violated by a caller
    #[error("accounting error: {0}")]
    Accounting(String),

    /// A spawned unit panicked or was aborted
    #[error("{unit} did not finish: {reason}")]
    UnitPanicked {
        /// Unit name, e.g. `factory 3` or `supervisor`
        unit: String,
        /// Join error description
        reason: String,
    },

    /// The run was interrupted from outside
    #[error("run interrupted")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Required builder field was never set
    pub fn missing_config(field: &str) -> Self {
        Error::Config(ConfigError::Missing(field.to_string()))
    }

    /// Resource acquisition failure
    pub fn resource(message: impl Into<String>) -> Self {
        Error::ResourceAcquisition(message.into())
    }

    /// Delivery failure for the given factory and report kind
    pub fn delivery(factory_id: usize, kind: ReportKind) -> Self {
        Error::Delivery { factory_id, kind }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
