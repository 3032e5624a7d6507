use std::fmt::{Display, Formatter};

/// Error type for synchronizer construction, configuration and the mixer loop.
#[derive(Debug)]
pub enum SyncError {
    /// A producer could not be opened for the named source.
    Source { name: String, reason: String },
    /// The mixer thread could not be spawned.
    Thread(std::io::Error),
    /// A channel buffer lock was poisoned by a panicking holder.
    Poisoned(&'static str),
    Config(String),
    Io(std::io::Error),
    /// The downstream consumer rejected a frame or gap.
    Output(String),
}

impl SyncError {
    /// Build a [`SyncError::Source`] for the given source name.
    pub fn open_failed(name: &str, reason: impl Into<String>) -> Self {
        Self::Source {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source { name, reason } => {
                write!(f, "could not open source '{}': {}", name, reason)
            }
            Self::Thread(err) => write!(f, "could not spawn mixer thread: {}", err),
            Self::Poisoned(what) => write!(f, "lock poisoned: {}", what),
            Self::Config(err) => write!(f, "invalid configuration: {}", err),
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Output(err) => write!(f, "output error: {}", err),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<std::io::Error> for SyncError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value.to_string())
    }
}
