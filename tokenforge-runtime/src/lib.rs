pub mod call;
pub mod deploy;
pub mod events;
pub mod factory;
pub mod logic;
pub mod proxy;
pub mod state;

// Re-export the main types for convenience
pub use call::{CallOutput, FactoryCall};
pub use deploy::{deploy_implementation, deploy_proxy, TokenFactoryDeployer};
pub use events::{
    InMemoryEventIterator, InMemoryEventLog, TokenCreated, TokenEventIterator, TokenEventLog,
};
pub use factory::{
    CreationPolicy, FactoryConfig, StandaloneFactory, TokenFactory, TOKEN_FACTORY_NAME,
};
pub use logic::{ExecContext, FactoryLogic, LogicFactory};
pub use proxy::DelegationProxy;
pub use state::{FactoryState, ProxySlots};
