use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("invalid status '{0}': expected Planning, Development, Testing, Deployment or Completed")]
    InvalidStatus(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("store failure: {0}")]
    Store(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("{message}")]
    Parse { message: String, raw: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl DashError {
    /// True for errors a caller can fix by changing its input (HTTP 400).
    pub fn is_validation(&self) -> bool {
        matches!(self, DashError::Validation(_) | DashError::InvalidStatus(_))
    }
}

impl From<reqwest::Error> for DashError {
    fn from(e: reqwest::Error) -> Self {
        DashError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
