//! Domain error types.

/// Top-level error type for edgelab.
#[derive(Debug, thiserror::Error)]
pub enum EdgelabError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid execution record {line}: {reason}")]
    InvalidExecution { line: usize, reason: String },

    #[error("invalid cash event record {line}: {reason}")]
    InvalidCashEvent { line: usize, reason: String },

    #[error("invalid simulation config: {reason}")]
    SimulationConfig { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&EdgelabError> for std::process::ExitCode {
    fn from(err: &EdgelabError) -> Self {
        let code: u8 = match err {
            EdgelabError::Io(_) => 1,
            EdgelabError::ConfigParse { .. }
            | EdgelabError::ConfigMissing { .. }
            | EdgelabError::ConfigInvalid { .. } => 2,
            EdgelabError::DataSource { .. } => 3,
            EdgelabError::InvalidExecution { .. } | EdgelabError::InvalidCashEvent { .. } => 4,
            EdgelabError::SimulationConfig { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
