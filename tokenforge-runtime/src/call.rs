use serde::{Deserialize, Serialize};
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;

/// A call into the factory surface.
///
/// Calls cross the proxy boundary either as this enum directly or as a
/// bincode-encoded payload (construction init data, migration data, raw
/// dispatch), so every variant is serde-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryCall {
    /// One-shot initialization; the single allowed writer of the owner slot
    Initialize { owner: Address },

    /// Create a new token with the caller recorded as creator and admin
    CreateToken {
        name: String,
        symbol: String,
        initial_supply: u128,
    },

    /// Look up a token address by its sequential identifier
    GetToken { id: u64 },

    /// Current registry length
    TokenCount,

    /// The full ordered sequence of token addresses
    AllTokens,

    /// Ordered addresses of the tokens a principal created
    UserTokens { creator: Address },
}

impl FactoryCall {
    /// Encode the call for transport across the proxy boundary
    pub fn encode(&self) -> Result<Vec<u8>, FactoryError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a call from an encoded payload
    pub fn decode(payload: &[u8]) -> Result<Self, FactoryError> {
        Ok(bincode::deserialize(payload)?)
    }
}

/// The typed result of a factory call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    /// No return value (administrative calls)
    None,

    /// Identifier and address of a freshly created token
    Created { id: u64, address: Address },

    /// A single token address
    TokenAddress(Address),

    /// A registry count
    Count(u64),

    /// An ordered sequence of token addresses
    Addresses(Vec<Address>),
}

impl CallOutput {
    pub fn encode(&self) -> Result<Vec<u8>, FactoryError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self, FactoryError> {
        Ok(bincode::deserialize(payload)?)
    }

    /// The (id, address) pair if this is a creation result
    pub fn as_created(&self) -> Option<(u64, Address)> {
        match self {
            CallOutput::Created { id, address } => Some((*id, *address)),
            _ => None,
        }
    }

    /// The address if this is a single-address result
    pub fn as_address(&self) -> Option<Address> {
        match self {
            CallOutput::TokenAddress(address) => Some(*address),
            _ => None,
        }
    }

    /// The count if this is a count result
    pub fn as_count(&self) -> Option<u64> {
        match self {
            CallOutput::Count(count) => Some(*count),
            _ => None,
        }
    }

    /// The address sequence if this is a list result
    pub fn as_addresses(&self) -> Option<&[Address]> {
        match self {
            CallOutput::Addresses(addresses) => Some(addresses),
            _ => None,
        }
    }
}
