//! Domain error types.

/// Top-level error type for tokensim.
#[derive(Debug, thiserror::Error)]
pub enum TokensimError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("invalid strategy: {}", violations.join("; "))]
    StrategyInvalid { violations: Vec<String> },

    #[error("no lifecycle records between {start} and {end}")]
    NoData { start: i64, end: i64 },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TokensimError> for std::process::ExitCode {
    fn from(err: &TokensimError) -> Self {
        let code: u8 = match err {
            TokensimError::Io(_) | TokensimError::Report { .. } => 1,
            TokensimError::ConfigParse { .. }
            | TokensimError::ConfigMissing { .. }
            | TokensimError::ConfigInvalid { .. } => 2,
            TokensimError::Database { .. } | TokensimError::DatabaseQuery { .. } => 3,
            TokensimError::StrategyInvalid { .. } => 4,
            TokensimError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
