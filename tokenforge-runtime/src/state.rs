use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;
use tokenforge_core::token::Token;

/// Proxy-reserved storage slots.
///
/// These live in their own struct so no implementation version can collide
/// them with registry storage: implementations receive `ProxySlots` and
/// `FactoryState` as separate references and the proxy keeps them in
/// separate fields for its whole lifetime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxySlots {
    /// Set exactly once, by the first successful Initialize call
    pub initialized: bool,

    /// The administrative owner; None before initialization and after renounce
    pub owner: Option<Address>,
}

impl ProxySlots {
    /// Authorization guard for administrative operations.
    ///
    /// A renounced owner slot (None) fails for every caller.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), FactoryError> {
        match &self.owner {
            Some(owner) if owner == caller => Ok(()),
            _ => Err(FactoryError::Unauthorized),
        }
    }

    /// Replace the owner. Restricted to the current owner.
    pub fn transfer_owner(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(FactoryError::InvalidOwner);
        }
        self.owner = Some(new_owner);
        Ok(())
    }

    /// Clear the owner slot. Restricted to the current owner. Irreversible.
    pub fn renounce_owner(&mut self, caller: &Address) -> Result<(), FactoryError> {
        self.ensure_owner(caller)?;
        self.owner = None;
        Ok(())
    }
}

/// The registry storage owned by the proxy and transformed by whichever
/// implementation is currently active.
///
/// Append-only: tokens are pushed in creation order and never removed,
/// reordered, or replaced, so a token's index is its identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactoryState {
    tokens: Vec<Token>,
    by_creator: HashMap<Address, Vec<u64>>,
    by_address: HashMap<Address, u64>,
}

impl FactoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current registry length
    pub fn count(&self) -> u64 {
        self.tokens.len() as u64
    }

    /// Append a token to the registry and its secondary indexes.
    ///
    /// The token must carry the identifier equal to the current length.
    pub fn append(&mut self, token: Token) -> u64 {
        debug_assert_eq!(token.id(), self.count());
        let id = token.id();
        self.by_creator.entry(*token.creator()).or_default().push(id);
        self.by_address.insert(*token.address(), id);
        self.tokens.push(token);
        id
    }

    pub fn token(&self, id: u64) -> Option<&Token> {
        self.tokens.get(id as usize)
    }

    pub fn token_mut(&mut self, id: u64) -> Option<&mut Token> {
        self.tokens.get_mut(id as usize)
    }

    pub fn token_by_address(&self, address: &Address) -> Option<&Token> {
        self.by_address.get(address).and_then(|id| self.token(*id))
    }

    pub fn token_by_address_mut(&mut self, address: &Address) -> Option<&mut Token> {
        match self.by_address.get(address) {
            Some(id) => self.tokens.get_mut(*id as usize),
            None => None,
        }
    }

    /// All token addresses in creation order
    pub fn all_addresses(&self) -> Vec<Address> {
        self.tokens.iter().map(|t| *t.address()).collect()
    }

    /// Identifiers created by a principal, in creation order
    pub fn ids_by_creator(&self, creator: &Address) -> Vec<u64> {
        self.by_creator.get(creator).cloned().unwrap_or_default()
    }

    /// Addresses created by a principal, in creation order
    pub fn addresses_by_creator(&self, creator: &Address) -> Vec<Address> {
        self.by_creator
            .get(creator)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.token(*id).map(|t| *t.address()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a (name, symbol) pair is already registered
    pub fn has_pair(&self, name: &str, symbol: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| t.name() == name && t.symbol() == symbol)
    }
}
