use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("Malformed reading: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
