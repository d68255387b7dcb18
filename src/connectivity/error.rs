use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("client connect timed out")]
    Timeout,
    #[error("driver error: {0}")]
    Driver(String),
}
