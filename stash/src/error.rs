use thiserror::Error;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for StashError {
    fn from(err: anyhow::Error) -> Self {
        StashError::Internal(format!("{:#}", err))
    }
}

impl From<String> for StashError {
    fn from(err: String) -> Self {
        StashError::Internal(err)
    }
}

pub type Result<T> = std::result::Result<T, StashError>;
