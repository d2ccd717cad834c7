use crate::call::{CallOutput, FactoryCall};
use crate::events::{InMemoryEventLog, TokenCreated, TokenEventLog};
use crate::logic::{ExecContext, FactoryLogic};
use crate::state::{FactoryState, ProxySlots};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;
use tokenforge_core::token::Token;

/// Name reported by the stock factory implementation
pub const TOKEN_FACTORY_NAME: &str = "token-factory";

/// Who may create tokens through the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreationPolicy {
    /// Any principal may create tokens
    Open,
    /// Only the factory owner may create tokens
    OwnerOnly,
}

impl Default for CreationPolicy {
    fn default() -> Self {
        CreationPolicy::Open
    }
}

/// Configuration for the factory implementation.
///
/// The defaults are open creation and no duplicate rejection; both knobs are
/// policy choices, not fixed requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactoryConfig {
    pub creation_policy: CreationPolicy,

    /// When set, reject (name, symbol) pairs already in the registry
    pub reject_duplicates: bool,
}

/// The factory registry implementation.
///
/// Stateless with respect to persistent storage: everything it writes lands
/// in the `FactoryState`/`ProxySlots` borrowed through the execution
/// context. The only field is configuration.
pub struct TokenFactory {
    config: FactoryConfig,
}

impl TokenFactory {
    pub fn new() -> Self {
        Self::with_config(FactoryConfig::default())
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    fn initialize(&self, owner: Address, ctx: ExecContext<'_>) -> Result<CallOutput, FactoryError> {
        if ctx.slots.initialized {
            return Err(FactoryError::AlreadyInitialized);
        }
        if owner.is_zero() {
            return Err(FactoryError::InvalidOwner);
        }

        ctx.slots.owner = Some(owner);
        ctx.slots.initialized = true;
        info!("factory {} initialized with owner {}", ctx.factory, owner);
        Ok(CallOutput::None)
    }

    fn create_token(
        &self,
        name: String,
        symbol: String,
        initial_supply: u128,
        ctx: ExecContext<'_>,
    ) -> Result<CallOutput, FactoryError> {
        if self.config.creation_policy == CreationPolicy::OwnerOnly {
            ctx.slots.ensure_owner(&ctx.caller)?;
        }
        if self.config.reject_duplicates && ctx.state.has_pair(&name, &symbol) {
            return Err(FactoryError::DuplicateToken { name, symbol });
        }

        let id = ctx.state.count();
        let (address, _) = Address::derive(&[
            b"token",
            ctx.factory.bytes(),
            ctx.caller.bytes(),
            &id.to_le_bytes(),
            name.as_bytes(),
            symbol.as_bytes(),
        ]);

        let token = Token::new(
            id,
            address,
            ctx.caller,
            name.clone(),
            symbol.clone(),
            initial_supply,
        );
        ctx.state.append(token);
        ctx.events.push(TokenCreated::new(
            id,
            ctx.factory,
            address,
            ctx.caller,
            name,
            symbol,
            initial_supply,
        ));

        debug!("token {} created at {} by {}", id, address, ctx.caller);
        Ok(CallOutput::Created { id, address })
    }
}

impl Default for TokenFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl FactoryLogic for TokenFactory {
    fn name(&self) -> &str {
        TOKEN_FACTORY_NAME
    }

    fn version(&self) -> u32 {
        1
    }

    fn execute(&self, call: FactoryCall, ctx: ExecContext<'_>) -> Result<CallOutput, FactoryError> {
        match call {
            FactoryCall::Initialize { owner } => self.initialize(owner, ctx),
            FactoryCall::CreateToken {
                name,
                symbol,
                initial_supply,
            } => self.create_token(name, symbol, initial_supply, ctx),
            FactoryCall::GetToken { id } => ctx
                .state
                .token(id)
                .map(|t| CallOutput::TokenAddress(*t.address()))
                .ok_or(FactoryError::NotFound(id)),
            FactoryCall::TokenCount => Ok(CallOutput::Count(ctx.state.count())),
            FactoryCall::AllTokens => Ok(CallOutput::Addresses(ctx.state.all_addresses())),
            FactoryCall::UserTokens { creator } => {
                Ok(CallOutput::Addresses(ctx.state.addresses_by_creator(&creator)))
            }
        }
    }
}

/// A factory deployed directly, without the delegation proxy in front.
///
/// The non-upgradeable path: the owner is fixed at construction (the way the
/// original direct deployment sets the deployer as owner) and the
/// implementation cannot be swapped. Registry semantics are identical to the
/// proxied path because both run the same `TokenFactory` logic.
pub struct StandaloneFactory {
    address: Address,
    logic: TokenFactory,
    slots: ProxySlots,
    state: FactoryState,
    event_log: InMemoryEventLog,
}

impl StandaloneFactory {
    pub fn new(owner: Address) -> Self {
        Self::with_config(owner, FactoryConfig::default())
    }

    pub fn with_config(owner: Address, config: FactoryConfig) -> Self {
        let (address, _) = Address::derive(&[b"factory", owner.bytes()]);
        Self {
            address,
            logic: TokenFactory::with_config(config),
            slots: ProxySlots {
                initialized: true,
                owner: Some(owner),
            },
            state: FactoryState::new(),
            event_log: InMemoryEventLog::new(),
        }
    }

    fn call(&mut self, caller: Address, call: FactoryCall) -> Result<CallOutput, FactoryError> {
        let mut staged = Vec::new();
        let ctx = ExecContext {
            caller,
            factory: self.address,
            slots: &mut self.slots,
            state: &mut self.state,
            events: &mut staged,
        };
        let output = self.logic.execute(call, ctx)?;
        for event in &staged {
            self.event_log.record(event)?;
        }
        Ok(output)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> Option<Address> {
        self.slots.owner
    }

    /// Create a token, returning its identifier and address
    pub fn create_token(
        &mut self,
        caller: Address,
        name: &str,
        symbol: &str,
        initial_supply: u128,
    ) -> Result<(u64, Address), FactoryError> {
        let output = self.call(
            caller,
            FactoryCall::CreateToken {
                name: name.to_string(),
                symbol: symbol.to_string(),
                initial_supply,
            },
        )?;
        // CreateToken always returns Created on success
        Ok(output.as_created().expect("create returned Created"))
    }

    pub fn get_token(&self, id: u64) -> Result<Address, FactoryError> {
        self.state
            .token(id)
            .map(|t| *t.address())
            .ok_or(FactoryError::NotFound(id))
    }

    pub fn token_count(&self) -> u64 {
        self.state.count()
    }

    pub fn all_tokens(&self) -> Vec<Address> {
        self.state.all_addresses()
    }

    pub fn user_tokens(&self, creator: &Address) -> Vec<Address> {
        self.state.addresses_by_creator(creator)
    }

    /// Read access to a token's full record and ledger
    pub fn token(&self, id: u64) -> Option<&Token> {
        self.state.token(id)
    }

    /// Ledger access for unit-local operations, gated by the token's own admin
    pub fn token_mut(&mut self, id: u64) -> Option<&mut Token> {
        self.state.token_mut(id)
    }

    pub fn token_by_address(&self, address: &Address) -> Option<&Token> {
        self.state.token_by_address(address)
    }

    pub fn token_by_address_mut(&mut self, address: &Address) -> Option<&mut Token> {
        self.state.token_by_address_mut(address)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), FactoryError> {
        self.slots.transfer_owner(&caller, new_owner)
    }

    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), FactoryError> {
        self.slots.renounce_owner(&caller)
    }

    pub fn event_log(&self) -> &InMemoryEventLog {
        &self.event_log
    }
}
