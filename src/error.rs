use thiserror::Error;

/// Errors surfaced by the notebook core.
///
/// None of these are fatal. The session turns each one into an inline
/// notice; fetch errors additionally keep the stale tree on screen.
#[derive(Debug, Error)]
pub enum SlateError {
    /// The collaborator was unreachable or answered with something unusable.
    #[error("could not load notebooks: {0}")]
    Fetch(String),

    #[error("a {kind} named \"{name}\" already exists here")]
    DuplicateName { kind: ItemKind, name: String },

    /// A bulk operation where some items failed. Reported, never thrown.
    #[error("{failed} of {} items failed", .successful + .failed)]
    PartialOperation { successful: usize, failed: usize },

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SlateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Folder,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

impl SlateError {
    pub fn is_duplicate_name(&self) -> bool {
        matches!(self, Self::DuplicateName { .. })
    }

    /// Whether the caller should offer a retry affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Io(_))
    }
}
