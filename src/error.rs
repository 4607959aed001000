pub type MuraleResult<T> = Result<T, MuraleError>;

/// Classified cause of a failed byte read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoKind {
    NotFound,
    PermissionDenied,
    IsADirectory,
    Other,
}

impl From<std::io::ErrorKind> for IoKind {
    fn from(kind: std::io::ErrorKind) -> Self {
        match kind {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            std::io::ErrorKind::IsADirectory => Self::IsADirectory,
            _ => Self::Other,
        }
    }
}

/// All failure modes of the engine core.
///
/// `Clone` on purpose: coalesced loads share one in-flight future, and a
/// single failure has to fan out to every waiter.
#[derive(thiserror::Error, Clone, Debug)]
pub enum MuraleError {
    #[error("path error: {0}")]
    Path(String),

    #[error("io error ({kind:?}) for '{path}': {message}")]
    Io {
        path: String,
        kind: IoKind,
        message: String,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("host error: {0}")]
    Host(String),
}

impl MuraleError {
    pub fn path(msg: impl Into<String>) -> Self {
        Self::Path(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }

    /// The classified io kind, when this is an io error.
    pub fn io_kind(&self) -> Option<IoKind> {
        match self {
            Self::Io { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
