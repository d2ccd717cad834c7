//! # Delegation proxy
//!
//! The long-lived entry point of the factory runtime.
//!
//! ## Responsibilities
//! - **Routing:** forwards every factory call into the current
//!   implementation, with the proxy's own storage as execution context.
//! - **Storage ownership:** the proxy owns all persistent state. The
//!   reserved slots (`ProxySlots`: initialized flag, owner) and the registry
//!   (`FactoryState`) live in separate fields, so no implementation version
//!   can collide registry data with the pointer/flag slots.
//! - **Upgrades:** the implementation pointer is replaced only through the
//!   owner-gated `upgrade_to`; a failed migration rolls the pointer back.
//! - **Atomicity:** a call either commits all of its writes and notifications
//!   or none of them.

use crate::call::{CallOutput, FactoryCall};
use crate::events::{InMemoryEventLog, TokenEventLog};
use crate::logic::{ExecContext, FactoryLogic};
use crate::state::{FactoryState, ProxySlots};
use log::{debug, info, warn};
use std::sync::Arc;
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;
use tokenforge_core::token::Token;

/// Stable entry point whose behavior is defined by a replaceable
/// implementation, while its storage survives implementation swaps.
pub struct DelegationProxy {
    /// Address callers reach this proxy at
    address: Address,

    /// The current implementation; replaced only by `upgrade_to`
    implementation: Box<dyn FactoryLogic>,

    /// Reserved slots, isolated from implementation-written storage
    slots: ProxySlots,

    /// Storage written by the implementation on each call
    state: FactoryState,

    /// Sink for creation notifications
    event_log: Arc<dyn TokenEventLog>,
}

impl DelegationProxy {
    /// Deploy a proxy in front of an implementation and immediately forward
    /// the initialization call into it, so initialize-time writes land in
    /// the proxy's own storage.
    ///
    /// Fails with `Construction` if the implementation reference is invalid
    /// or the forwarded initialization call fails; no proxy exists on
    /// failure.
    pub fn new(
        implementation: Box<dyn FactoryLogic>,
        init_call: FactoryCall,
        deployer: Address,
    ) -> Result<Self, FactoryError> {
        Self::with_event_log(
            implementation,
            init_call,
            deployer,
            Arc::new(InMemoryEventLog::new()),
        )
    }

    /// Deploy with an externally supplied event log
    pub fn with_event_log(
        implementation: Box<dyn FactoryLogic>,
        init_call: FactoryCall,
        deployer: Address,
        event_log: Arc<dyn TokenEventLog>,
    ) -> Result<Self, FactoryError> {
        validate_reference(&*implementation).map_err(FactoryError::Construction)?;

        let (address, _) = Address::derive(&[
            b"proxy",
            deployer.bytes(),
            implementation.name().as_bytes(),
        ]);

        let mut proxy = Self {
            address,
            implementation,
            slots: ProxySlots::default(),
            state: FactoryState::new(),
            event_log,
        };

        if let Err(e) = proxy.execute(deployer, init_call) {
            return Err(FactoryError::Construction(e.to_string()));
        }

        info!(
            "proxy {} deployed over implementation {} v{}",
            proxy.address,
            proxy.implementation.name(),
            proxy.implementation.version()
        );
        Ok(proxy)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> Option<Address> {
        self.slots.owner
    }

    pub fn is_initialized(&self) -> bool {
        self.slots.initialized
    }

    pub fn implementation_name(&self) -> &str {
        self.implementation.name()
    }

    pub fn implementation_version(&self) -> u32 {
        self.implementation.version()
    }

    pub fn event_log(&self) -> &Arc<dyn TokenEventLog> {
        &self.event_log
    }

    /// Execute a call against the current implementation.
    ///
    /// The implementation runs against working copies of the proxy's
    /// storage; the copies replace the committed storage and the staged
    /// notifications reach the event log only when the call succeeds, so a
    /// failed call leaves nothing behind.
    pub fn execute(
        &mut self,
        caller: Address,
        call: FactoryCall,
    ) -> Result<CallOutput, FactoryError> {
        let mut slots = self.slots.clone();
        let mut state = self.state.clone();
        let mut staged = Vec::new();

        let output = self.implementation.execute(
            call,
            ExecContext {
                caller,
                factory: self.address,
                slots: &mut slots,
                state: &mut state,
                events: &mut staged,
            },
        )?;

        self.slots = slots;
        self.state = state;
        for event in &staged {
            self.event_log.record(event)?;
        }
        Ok(output)
    }

    /// Execute a bincode-encoded call, returning the encoded output.
    ///
    /// The byte-level pass-through surface: callers that only hold an
    /// encoded payload are forwarded like any other call.
    pub fn execute_encoded(
        &mut self,
        caller: Address,
        payload: &[u8],
    ) -> Result<Vec<u8>, FactoryError> {
        let call = FactoryCall::decode(payload)?;
        let output = self.execute(caller, call)?;
        output.encode()
    }

    /// Replace the implementation. Restricted to the owner.
    ///
    /// If a migration call is supplied it runs against the new
    /// implementation first; the pointer swap commits together with the
    /// migration's writes or not at all.
    pub fn upgrade_to(
        &mut self,
        caller: Address,
        new_implementation: Box<dyn FactoryLogic>,
        migration: Option<FactoryCall>,
    ) -> Result<(), FactoryError> {
        self.slots.ensure_owner(&caller)?;
        validate_reference(&*new_implementation).map_err(FactoryError::Upgrade)?;

        if let Some(call) = migration {
            let mut slots = self.slots.clone();
            let mut state = self.state.clone();
            let mut staged = Vec::new();

            let migrated = new_implementation.execute(
                call,
                ExecContext {
                    caller,
                    factory: self.address,
                    slots: &mut slots,
                    state: &mut state,
                    events: &mut staged,
                },
            );
            match migrated {
                Ok(_) => {
                    self.slots = slots;
                    self.state = state;
                    for event in &staged {
                        self.event_log.record(event)?;
                    }
                }
                // Migration failed: keep the old pointer and the old state
                Err(e) => return Err(FactoryError::Upgrade(e.to_string())),
            }
        }

        info!(
            "proxy {} upgraded {} v{} -> {} v{}",
            self.address,
            self.implementation.name(),
            self.implementation.version(),
            new_implementation.name(),
            new_implementation.version()
        );
        self.implementation = new_implementation;
        Ok(())
    }

    /// Hand the owner slot to another principal. Restricted to the owner.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), FactoryError> {
        self.slots.transfer_owner(&caller, new_owner)?;
        debug!("proxy {} ownership transferred to {}", self.address, new_owner);
        Ok(())
    }

    /// Clear the owner slot. Restricted to the owner. After this no
    /// upgrade or ownership operation can ever succeed again.
    pub fn renounce_ownership(&mut self, caller: Address) -> Result<(), FactoryError> {
        self.slots.renounce_owner(&caller)?;
        warn!(
            "proxy {} ownership renounced; upgrades are permanently disabled",
            self.address
        );
        Ok(())
    }

    /// Read access to a token's full record and ledger
    pub fn token(&self, id: u64) -> Option<&Token> {
        self.state.token(id)
    }

    pub fn token_by_address(&self, address: &Address) -> Option<&Token> {
        self.state.token_by_address(address)
    }

    /// Ledger access for unit-local operations, gated by the token's own
    /// admin rather than the proxy owner
    pub fn token_mut(&mut self, id: u64) -> Option<&mut Token> {
        self.state.token_mut(id)
    }
}

/// A `Box<dyn FactoryLogic>` cannot be null, so the reachable invalid
/// reference is an implementation that reports an empty name.
fn validate_reference(implementation: &dyn FactoryLogic) -> Result<(), String> {
    if implementation.name().is_empty() {
        return Err("implementation reports an empty name".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{CreationPolicy, FactoryConfig, TokenFactory};

    fn addr(byte: u8) -> Address {
        Address::new([byte; 32])
    }

    fn deploy(owner: Address) -> DelegationProxy {
        DelegationProxy::new(
            Box::new(TokenFactory::new()),
            FactoryCall::Initialize { owner },
            owner,
        )
        .unwrap()
    }

    fn create(
        proxy: &mut DelegationProxy,
        caller: Address,
        name: &str,
        symbol: &str,
        supply: u128,
    ) -> (u64, Address) {
        proxy
            .execute(
                caller,
                FactoryCall::CreateToken {
                    name: name.to_string(),
                    symbol: symbol.to_string(),
                    initial_supply: supply,
                },
            )
            .unwrap()
            .as_created()
            .unwrap()
    }

    /// Implementation whose execute always fails; used to exercise
    /// construction and migration failure paths
    struct FailingLogic;

    impl FactoryLogic for FailingLogic {
        fn name(&self) -> &str {
            "failing"
        }

        fn version(&self) -> u32 {
            1
        }

        fn execute(
            &self,
            _call: FactoryCall,
            _ctx: ExecContext<'_>,
        ) -> Result<CallOutput, FactoryError> {
            Err(FactoryError::Context(anyhow::anyhow!("always fails")))
        }
    }

    /// Implementation reporting an empty name; an invalid reference
    struct NamelessLogic;

    impl FactoryLogic for NamelessLogic {
        fn name(&self) -> &str {
            ""
        }

        fn version(&self) -> u32 {
            1
        }

        fn execute(
            &self,
            _call: FactoryCall,
            _ctx: ExecContext<'_>,
        ) -> Result<CallOutput, FactoryError> {
            Ok(CallOutput::None)
        }
    }

    #[test]
    fn test_initializes_with_correct_owner() {
        let proxy = deploy(addr(1));
        assert!(proxy.is_initialized());
        assert_eq!(proxy.owner(), Some(addr(1)));
        assert_eq!(proxy.implementation_name(), "token-factory");
        assert_eq!(proxy.implementation_version(), 1);
    }

    #[test]
    fn test_construction_fails_when_init_fails() {
        // Zero owner makes the forwarded Initialize fail
        let result = DelegationProxy::new(
            Box::new(TokenFactory::new()),
            FactoryCall::Initialize {
                owner: Address::zero(),
            },
            addr(1),
        );
        assert!(matches!(result, Err(FactoryError::Construction(_))));
    }

    #[test]
    fn test_construction_rejects_invalid_reference() {
        let result = DelegationProxy::new(
            Box::new(NamelessLogic),
            FactoryCall::Initialize { owner: addr(1) },
            addr(1),
        );
        assert!(matches!(result, Err(FactoryError::Construction(_))));
    }

    #[test]
    fn test_construction_propagates_inner_failure() {
        let result = DelegationProxy::new(
            Box::new(FailingLogic),
            FactoryCall::Initialize { owner: addr(1) },
            addr(1),
        );
        match result {
            Err(FactoryError::Construction(msg)) => assert!(msg.contains("always fails")),
            other => panic!("expected Construction error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_initialize_succeeds_exactly_once() {
        let mut proxy = deploy(addr(1));

        // Any caller, any argument: the second attempt fails
        let again = proxy.execute(addr(1), FactoryCall::Initialize { owner: addr(1) });
        assert!(matches!(again, Err(FactoryError::AlreadyInitialized)));

        let hijack = proxy.execute(addr(2), FactoryCall::Initialize { owner: addr(2) });
        assert!(matches!(hijack, Err(FactoryError::AlreadyInitialized)));

        assert_eq!(proxy.owner(), Some(addr(1)));
    }

    #[test]
    fn test_create_through_proxy() {
        let mut proxy = deploy(addr(1));
        let (id, address) = create(&mut proxy, addr(1), "Test Token", "TST", 1000);

        assert_eq!(id, 0);

        let all = proxy
            .execute(addr(1), FactoryCall::AllTokens)
            .unwrap();
        assert_eq!(all.as_addresses().unwrap(), &[address]);

        let user = proxy
            .execute(addr(1), FactoryCall::UserTokens { creator: addr(1) })
            .unwrap();
        assert_eq!(user.as_addresses().unwrap(), &[address]);

        let token = proxy.token(0).unwrap();
        assert_eq!(token.name(), "Test Token");
        assert_eq!(token.symbol(), "TST");
        assert_eq!(token.total_supply(), 1000);
        assert_eq!(token.balance_of(&addr(1)), 1000);
    }

    #[test]
    fn test_count_and_order_match_calls() {
        let mut proxy = deploy(addr(1));
        let (_, a) = create(&mut proxy, addr(1), "A", "a", 0);
        let (_, b) = create(&mut proxy, addr(2), "B", "b", 100);
        let (_, c) = create(&mut proxy, addr(1), "C", "c", u128::MAX);

        let count = proxy
            .execute(addr(3), FactoryCall::TokenCount)
            .unwrap()
            .as_count()
            .unwrap();
        assert_eq!(count, 3);

        let all = proxy.execute(addr(3), FactoryCall::AllTokens).unwrap();
        assert_eq!(all.as_addresses().unwrap(), &[a, b, c]);

        let missing = proxy.execute(addr(3), FactoryCall::GetToken { id: 3 });
        assert!(matches!(missing, Err(FactoryError::NotFound(3))));
    }

    #[test]
    fn test_get_token_round_trip() {
        let mut proxy = deploy(addr(1));
        let (_, created) = create(&mut proxy, addr(1), "T", "TK", 1000);

        let fetched = proxy
            .execute(addr(2), FactoryCall::GetToken { id: 0 })
            .unwrap()
            .as_address()
            .unwrap();
        assert_eq!(fetched, created);

        let token = proxy.token_by_address(&created).unwrap();
        assert_eq!(token.name(), "T");
        assert_eq!(token.symbol(), "TK");
        assert_eq!(token.initial_supply(), 1000);
    }

    #[test]
    fn test_creation_open_to_any_caller() {
        let mut proxy = deploy(addr(1));
        create(&mut proxy, addr(7), "Anyone", "ANY", 5);

        let user = proxy
            .execute(addr(7), FactoryCall::UserTokens { creator: addr(7) })
            .unwrap();
        assert_eq!(user.as_addresses().unwrap().len(), 1);
    }

    #[test]
    fn test_events_recorded_in_call_order() {
        let mut proxy = deploy(addr(1));
        create(&mut proxy, addr(1), "A", "a", 1);
        create(&mut proxy, addr(2), "B", "b", 2);

        let log = proxy.event_log().clone();
        assert_eq!(log.event_count(), 2);

        let ids: Vec<u64> = log.events().map(|e| e.unwrap().token_id).collect();
        assert_eq!(ids, vec![0, 1]);

        let first = log.events().next().unwrap().unwrap();
        assert_eq!(first.factory, *proxy.address());
        assert_eq!(first.creator, addr(1));
    }

    #[test]
    fn test_failed_call_commits_nothing() {
        let owner = addr(1);
        let config = FactoryConfig {
            creation_policy: CreationPolicy::OwnerOnly,
            ..FactoryConfig::default()
        };
        let mut proxy = DelegationProxy::new(
            Box::new(TokenFactory::with_config(config)),
            FactoryCall::Initialize { owner },
            owner,
        )
        .unwrap();

        let denied = proxy.execute(
            addr(2),
            FactoryCall::CreateToken {
                name: "Denied".to_string(),
                symbol: "DND".to_string(),
                initial_supply: 100,
            },
        );
        assert!(matches!(denied, Err(FactoryError::Unauthorized)));

        // Registry length, owner, and the event log are untouched
        let count = proxy
            .execute(owner, FactoryCall::TokenCount)
            .unwrap()
            .as_count()
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(proxy.owner(), Some(owner));
        assert_eq!(proxy.event_log().event_count(), 0);
    }

    #[test]
    fn test_execute_encoded_pass_through() {
        let mut proxy = deploy(addr(1));

        let payload = FactoryCall::CreateToken {
            name: "Wire Token".to_string(),
            symbol: "WIR".to_string(),
            initial_supply: 42,
        }
        .encode()
        .unwrap();

        let encoded_output = proxy.execute_encoded(addr(1), &payload).unwrap();
        let output = CallOutput::decode(&encoded_output).unwrap();
        let (id, address) = output.as_created().unwrap();

        assert_eq!(id, 0);
        assert_eq!(proxy.token(0).unwrap().address(), &address);
    }

    #[test]
    fn test_execute_encoded_rejects_garbage() {
        let mut proxy = deploy(addr(1));
        let result = proxy.execute_encoded(addr(1), &[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(FactoryError::Serialization(_))));
    }

    #[test]
    fn test_upgrade_requires_owner() {
        let mut proxy = deploy(addr(1));

        let result = proxy.upgrade_to(addr(2), Box::new(TokenFactory::new()), None);
        assert!(matches!(result, Err(FactoryError::Unauthorized)));
        assert_eq!(proxy.implementation_name(), "token-factory");
        assert_eq!(proxy.implementation_version(), 1);
    }

    #[test]
    fn test_upgrade_preserves_registry() {
        let mut proxy = deploy(addr(1));
        let (_, before_a) = create(&mut proxy, addr(1), "A", "a", 10);
        let (_, before_b) = create(&mut proxy, addr(2), "B", "b", 20);

        // Swap in a differently configured implementation
        let config = FactoryConfig {
            creation_policy: CreationPolicy::OwnerOnly,
            ..FactoryConfig::default()
        };
        proxy
            .upgrade_to(addr(1), Box::new(TokenFactory::with_config(config)), None)
            .unwrap();

        // Entries created before the upgrade are retrievable unchanged
        let a = proxy
            .execute(addr(3), FactoryCall::GetToken { id: 0 })
            .unwrap()
            .as_address()
            .unwrap();
        let b = proxy
            .execute(addr(3), FactoryCall::GetToken { id: 1 })
            .unwrap()
            .as_address()
            .unwrap();
        assert_eq!((a, b), (before_a, before_b));
        assert_eq!(proxy.token(0).unwrap().name(), "A");

        // The new behavior is live: non-owner creation is now rejected
        let denied = proxy.execute(
            addr(2),
            FactoryCall::CreateToken {
                name: "C".to_string(),
                symbol: "c".to_string(),
                initial_supply: 30,
            },
        );
        assert!(matches!(denied, Err(FactoryError::Unauthorized)));

        // The owner can still create, extending the same registry
        create(&mut proxy, addr(1), "C", "c", 30);
        let count = proxy
            .execute(addr(1), FactoryCall::TokenCount)
            .unwrap()
            .as_count()
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_upgrade_with_migration_call() {
        let mut proxy = deploy(addr(1));
        create(&mut proxy, addr(1), "A", "a", 10);

        // A migration call that creates a marker token under the new logic
        proxy
            .upgrade_to(
                addr(1),
                Box::new(TokenFactory::new()),
                Some(FactoryCall::CreateToken {
                    name: "Migrated".to_string(),
                    symbol: "MIG".to_string(),
                    initial_supply: 0,
                }),
            )
            .unwrap();

        assert_eq!(proxy.token(1).unwrap().name(), "Migrated");
        assert_eq!(proxy.event_log().event_count(), 2);
    }

    #[test]
    fn test_failed_migration_rolls_back_pointer_and_state() {
        let mut proxy = deploy(addr(1));
        create(&mut proxy, addr(1), "A", "a", 10);

        let result = proxy.upgrade_to(
            addr(1),
            Box::new(FailingLogic),
            Some(FactoryCall::TokenCount),
        );
        assert!(matches!(result, Err(FactoryError::Upgrade(_))));

        // Pointer and state both unchanged
        assert_eq!(proxy.implementation_name(), "token-factory");
        let count = proxy
            .execute(addr(1), FactoryCall::TokenCount)
            .unwrap()
            .as_count()
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_upgrade_rejects_invalid_reference() {
        let mut proxy = deploy(addr(1));

        let result = proxy.upgrade_to(addr(1), Box::new(NamelessLogic), None);
        assert!(matches!(result, Err(FactoryError::Upgrade(_))));
        assert_eq!(proxy.implementation_name(), "token-factory");
    }

    #[test]
    fn test_ownership_transfer_through_proxy() {
        let mut proxy = deploy(addr(1));

        assert!(matches!(
            proxy.transfer_ownership(addr(2), addr(3)),
            Err(FactoryError::Unauthorized)
        ));

        proxy.transfer_ownership(addr(1), addr(2)).unwrap();
        assert_eq!(proxy.owner(), Some(addr(2)));

        // The new owner controls upgrades now
        assert!(matches!(
            proxy.upgrade_to(addr(1), Box::new(TokenFactory::new()), None),
            Err(FactoryError::Unauthorized)
        ));
        proxy
            .upgrade_to(addr(2), Box::new(TokenFactory::new()), None)
            .unwrap();
    }

    #[test]
    fn test_transfer_to_zero_address_rejected() {
        let mut proxy = deploy(addr(1));
        assert!(matches!(
            proxy.transfer_ownership(addr(1), Address::zero()),
            Err(FactoryError::InvalidOwner)
        ));
        assert_eq!(proxy.owner(), Some(addr(1)));
    }

    #[test]
    fn test_renounce_disables_upgrades_forever() {
        let mut proxy = deploy(addr(1));
        proxy.renounce_ownership(addr(1)).unwrap();
        assert_eq!(proxy.owner(), None);

        // Everyone is locked out, including the former owner
        assert!(matches!(
            proxy.upgrade_to(addr(1), Box::new(TokenFactory::new()), None),
            Err(FactoryError::Unauthorized)
        ));
        assert!(matches!(
            proxy.upgrade_to(addr(2), Box::new(TokenFactory::new()), None),
            Err(FactoryError::Unauthorized)
        ));

        // Pass-through reads keep working
        let count = proxy
            .execute(addr(1), FactoryCall::TokenCount)
            .unwrap()
            .as_count()
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_unit_ledger_through_proxy() {
        let mut proxy = deploy(addr(1));
        let (id, _) = create(&mut proxy, addr(1), "Ledger", "LDG", 1000);

        let token = proxy.token_mut(id).unwrap();
        token.transfer(&addr(1), &addr(2), 250).unwrap();
        token.pause(&addr(1)).unwrap();
        assert!(matches!(
            token.transfer(&addr(1), &addr(2), 1),
            Err(tokenforge_core::error::TokenError::Paused)
        ));

        assert_eq!(proxy.token(id).unwrap().balance_of(&addr(2)), 250);
    }
}
