use std::fmt;
use std::path::PathBuf;

/// Invalid weights or thresholds. The only fatal class: it would corrupt every row.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },

    #[error("{group} weights must sum to 1.0 (got {sum:.4})")]
    WeightSum { group: &'static str, sum: f64 },

    #[error("{group}.{name} weight must be a non-negative number (got {value})")]
    NegativeWeight {
        group: &'static str,
        name: &'static str,
        value: f64,
    },

    #[error("{name} out of range (got {value})")]
    OutOfRange { name: &'static str, value: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("no endpoint configured")]
    NotConfigured,

    #[error("live fetch disabled (offline)")]
    Offline,

    #[error("request failed: {0}")]
    Transport(String),

    #[error("http {status}: {snippet}")]
    Status { status: u16, snippet: String },

    #[error("malformed payload: {0}")]
    Parse(String),

    #[error("payload contained no usable rows")]
    Empty,

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    SourceUnavailable {
        source: String,
        reason: String,
    },
    IdentityMismatch {
        game: String,
        side: Side,
        what: String,
        value: String,
    },
    IncompleteGame {
        game: String,
        reason: String,
    },
}

impl Diagnostic {
    pub fn source_unavailable(source: impl Into<String>, err: &SourceError) -> Self {
        Diagnostic::SourceUnavailable {
            source: source.into(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SourceUnavailable { source, reason } => {
                write!(f, "[source unavailable] {source}: {reason}")
            }
            Diagnostic::IdentityMismatch {
                game,
                side,
                what,
                value,
            } => write!(f, "[identity mismatch] {game} ({side}): {what} {value:?} not matched"),
            Diagnostic::IncompleteGame { game, reason } => {
                write!(f, "[incomplete game] {game}: {reason}")
            }
        }
    }
}
