use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot create track {name}: {source}")]
    Create {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid track name: {0}")]
    InvalidName(String),
    #[error("track not found: {0}")]
    NotFound(String),
    #[error("track {0} is being recorded")]
    InUse(String),
}
