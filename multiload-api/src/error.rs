use thiserror::Error;

/// Errors raised by the multi-identifier loading layer.
///
/// Backing-store failures are carried through unchanged; this layer never
/// retries them.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("Backing store error: {0}")]
    BackingStore(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type LoadResult<T> = Result<T, LoadError>;
