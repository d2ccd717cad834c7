pub mod error;
pub mod id;
pub mod token;

// Re-export the main types for convenience
pub use error::{FactoryError, TokenError};
pub use id::Address;
pub use token::Token;
