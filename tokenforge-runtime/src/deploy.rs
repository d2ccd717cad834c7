use crate::call::FactoryCall;
use crate::factory::{FactoryConfig, TokenFactory, TOKEN_FACTORY_NAME};
use crate::logic::{FactoryLogic, LogicFactory};
use crate::proxy::DelegationProxy;
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;

/// Deploy a stock factory implementation with default configuration
pub fn deploy_implementation() -> Box<dyn FactoryLogic> {
    Box::new(TokenFactory::new())
}

/// Deploy a proxy in front of an implementation from an encoded
/// initialization payload, the way deployment tooling hands it over.
pub fn deploy_proxy(
    implementation: Box<dyn FactoryLogic>,
    encoded_init: &[u8],
    deployer: Address,
) -> Result<DelegationProxy, FactoryError> {
    let init_call = FactoryCall::decode(encoded_init)
        .map_err(|e| FactoryError::Construction(e.to_string()))?;
    DelegationProxy::new(implementation, init_call, deployer)
}

/// Factory for deploying stock `TokenFactory` implementations
pub struct TokenFactoryDeployer {
    config: FactoryConfig,
}

impl TokenFactoryDeployer {
    pub fn new() -> Self {
        Self {
            config: FactoryConfig::default(),
        }
    }

    pub fn with_config(config: FactoryConfig) -> Self {
        Self { config }
    }
}

impl Default for TokenFactoryDeployer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicFactory for TokenFactoryDeployer {
    fn deploy(&self) -> Box<dyn FactoryLogic> {
        Box::new(TokenFactory::with_config(self.config.clone()))
    }

    fn logic_name(&self) -> &str {
        TOKEN_FACTORY_NAME
    }
}
