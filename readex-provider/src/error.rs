use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("no content configured for round {0}")]
    UnknownRound(usize),

    #[error("generation worker is not running")]
    WorkerGone,

    #[error("{0}")]
    Other(String),
}
