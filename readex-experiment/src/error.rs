use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StimulusError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: csv::Error },

    #[error("{path} must contain a '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path}: column '{column}' clashes with a trial log column; rename it")]
    ReservedColumn { path: PathBuf, column: String },

    #[error("bad row {row} in {path}: {source}")]
    Row {
        path: PathBuf,
        row: usize,
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write log {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },

    #[error("failed to replace log {path}: {source}")]
    Replace {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stimulus(#[from] StimulusError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Provider(#[from] readex_provider::ProviderError),
}

/// A rejected gate: shown to the participant, no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MissingParticipant,
    MissingParticipantOrGroup,
    ResponseRequired,
    LogDirectory(String),
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::MissingParticipant => "Missing ID",
            Self::MissingParticipantOrGroup => "Missing details",
            Self::ResponseRequired => "Response required",
            Self::LogDirectory(_) => "Log folder unavailable",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingParticipant => "Please enter a valid Participant ID.".into(),
            Self::MissingParticipantOrGroup => {
                "Please input a valid Participant ID and select a Group.".into()
            }
            Self::ResponseRequired => "Please select an option before continuing.".into(),
            Self::LogDirectory(msg) => format!("The log folder could not be created.\n\n{msg}"),
        }
    }
}
