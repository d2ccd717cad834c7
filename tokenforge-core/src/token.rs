use crate::error::TokenError;
use crate::id::Address;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A token instance managed by the factory.
///
/// The creation metadata (identifier, address, creator, name, symbol,
/// initial supply) is fixed when the factory deploys the token. The ledger
/// fields below it are the token's own mutable state, administered by the
/// token admin rather than the factory owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Sequential identifier assigned by the factory registry
    id: u64,

    /// Address derived for this token at creation time
    address: Address,

    /// The principal that created this token through the factory
    creator: Address,

    name: String,
    symbol: String,

    /// Supply minted to the creator at construction
    initial_supply: u128,

    /// Unix timestamp of creation
    created_at: i64,

    /// The principal with authority over mint/burn_from/pause
    admin: Address,

    /// When set, balance-moving operations are rejected
    paused: bool,

    total_supply: u128,
    balances: HashMap<Address, u128>,
}

impl Token {
    /// Create a new token, minting the initial supply to the creator
    pub fn new(
        id: u64,
        address: Address,
        creator: Address,
        name: String,
        symbol: String,
        initial_supply: u128,
    ) -> Self {
        let mut balances = HashMap::new();
        if initial_supply > 0 {
            balances.insert(creator, initial_supply);
        }

        Self {
            id,
            address,
            creator,
            name,
            symbol,
            initial_supply,
            created_at: Utc::now().timestamp(),
            admin: creator,
            paused: false,
            total_supply: initial_supply,
            balances,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn creator(&self) -> &Address {
        &self.creator
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn initial_supply(&self) -> u128 {
        self.initial_supply
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn admin(&self) -> &Address {
        &self.admin
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn ensure_admin(&self, caller: &Address) -> Result<(), TokenError> {
        if caller != &self.admin {
            return Err(TokenError::Unauthorized);
        }
        Ok(())
    }

    fn ensure_not_paused(&self) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused);
        }
        Ok(())
    }

    fn debit(&mut self, holder: &Address, amount: u128) -> Result<(), TokenError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        // Checked above, cannot underflow
        self.balances.insert(*holder, available - amount);
        Ok(())
    }

    fn credit(&mut self, holder: &Address, amount: u128) -> Result<(), TokenError> {
        let balance = self.balance_of(holder);
        let updated = balance.checked_add(amount).ok_or(TokenError::Overflow)?;
        self.balances.insert(*holder, updated);
        Ok(())
    }

    /// Mint new supply to a holder. Restricted to the token admin.
    pub fn mint(&mut self, caller: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        self.ensure_admin(caller)?;
        self.ensure_not_paused()?;

        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.credit(to, amount)?;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Burn supply from the caller's own balance
    pub fn burn(&mut self, caller: &Address, amount: u128) -> Result<(), TokenError> {
        self.ensure_not_paused()?;
        self.debit(caller, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    /// Burn supply from any holder. Restricted to the token admin.
    pub fn burn_from(
        &mut self,
        caller: &Address,
        from: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.ensure_admin(caller)?;
        self.ensure_not_paused()?;
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    /// Move balance between holders
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        self.ensure_not_paused()?;
        self.debit(caller, amount)?;
        // Debit succeeded, so the credit can only fail on overflow; restore on failure
        if let Err(e) = self.credit(to, amount) {
            self.credit(caller, amount).ok();
            return Err(e);
        }
        Ok(())
    }

    /// Stop balance-moving operations. Restricted to the token admin.
    pub fn pause(&mut self, caller: &Address) -> Result<(), TokenError> {
        self.ensure_admin(caller)?;
        self.paused = true;
        Ok(())
    }

    /// Resume balance-moving operations. Restricted to the token admin.
    pub fn unpause(&mut self, caller: &Address) -> Result<(), TokenError> {
        self.ensure_admin(caller)?;
        self.paused = false;
        Ok(())
    }
}
