//! Error types for the `blockhand-agent` crate.

use blockhand_world::GatewayError;

/// Errors that end a task's main body.
///
/// Nothing here is process-fatal. Task entry points catch these at their
/// boundary, narrate a failure where appropriate, and return the task slot
/// to idle.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A world primitive rejected and the caller could not skip it.
    #[error("world operation failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The task no longer owns the task slot; another task or a global stop
    /// took it over while this one was suspended.
    #[error("task was preempted")]
    Preempted,
}

impl AgentError {
    /// Whether this is the cooperative-cancellation signal rather than a
    /// failure.
    pub const fn is_preempted(&self) -> bool {
        matches!(self, Self::Preempted)
    }
}

/// Errors that can occur when loading behaviour configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
