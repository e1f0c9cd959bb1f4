use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Verifier error: {0}")]
    Verifier(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    pub fn is_verifier_error(&self) -> bool {
        matches!(self, Error::Verifier(_))
    }
}
