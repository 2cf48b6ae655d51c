// Errors raised at the edges of the agent (parsing user-supplied values, exports)
// Routing and form submission never fail; they have no variants here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown access group: {0}")]
    UnknownAccessGroup(String),

    #[error("unknown history kind: {0} (expected 'views' or 'apis')")]
    UnknownHistoryKind(String),

    #[error("unknown form kind: {0} (expected 'view', 's3' or 'api')")]
    UnknownFormKind(String),

    #[error("no {kind} history record named '{name}'")]
    RecordNotFound { kind: String, name: String },

    #[error("invalid business date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("failed to load embedded history dataset: {0}")]
    Dataset(String),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;
