use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnterverseError {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
