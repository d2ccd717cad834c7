use thiserror::Error;

/// Represents all possible errors surfaced by the factory and proxy surface
#[derive(Error, Debug)]
pub enum FactoryError {
    /// The caller lacks the capability required for an administrative operation
    #[error("caller is not the owner")]
    Unauthorized,

    /// A second initialization attempt on an already-initialized proxy
    #[error("already initialized")]
    AlreadyInitialized,

    /// Lookup by an identifier at or beyond the current registry length
    #[error("token {0} does not exist")]
    NotFound(u64),

    /// Ownership transfer to the zero address
    #[error("new owner is the zero address")]
    InvalidOwner,

    /// Proxy construction failed, carrying the inner failure
    #[error("proxy construction failed: {0}")]
    Construction(String),

    /// Implementation upgrade failed, carrying the inner failure
    #[error("upgrade failed: {0}")]
    Upgrade(String),

    /// A (name, symbol) pair already registered, rejected by policy
    #[error("token ({name}, {symbol}) already registered")]
    DuplicateToken { name: String, symbol: String },

    /// Serialization/deserialization errors on encoded call payloads
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<bincode::Error> for FactoryError {
    fn from(err: bincode::Error) -> Self {
        FactoryError::Serialization(err.to_string())
    }
}

/// Errors raised by a token's own ledger operations
#[derive(Error, Debug)]
pub enum TokenError {
    /// The caller is not the token's admin
    #[error("caller is not the token admin")]
    Unauthorized,

    /// The token is paused and the operation moves balances
    #[error("token is paused")]
    Paused,

    /// Not enough balance to cover the operation
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u128, required: u128 },

    /// Supply arithmetic would overflow
    #[error("supply arithmetic overflow")]
    Overflow,
}
