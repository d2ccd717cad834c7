use crate::call::{CallOutput, FactoryCall};
use crate::events::TokenCreated;
use crate::state::{FactoryState, ProxySlots};
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;

/// The execution context provided to an implementation for one call.
///
/// All persistent storage is borrowed from the proxy: the reserved slots and
/// the registry state arrive as separate references, and events staged here
/// are only committed to the proxy's log when the call succeeds. An
/// implementation holds no persistent fields of its own.
pub struct ExecContext<'a> {
    /// The principal making this call
    pub caller: Address,

    /// Address of the entry point the call arrived through
    pub factory: Address,

    /// The proxy-reserved slots (initialized flag, owner)
    pub slots: &'a mut ProxySlots,

    /// The registry storage
    pub state: &'a mut FactoryState,

    /// Staging buffer for notifications emitted by this call
    pub events: &'a mut Vec<TokenCreated>,
}

/// Trait defining the interface for a swappable factory implementation.
///
/// Implementations define the transformation applied to the proxy's storage
/// on each call; the proxy chooses which implementation runs and owns every
/// byte the call touches.
pub trait FactoryLogic: Send + Sync {
    /// Get a string identifier for this implementation
    fn name(&self) -> &str;

    /// Get the implementation version
    fn version(&self) -> u32;

    /// Execute a call with the provided context
    fn execute(&self, call: FactoryCall, ctx: ExecContext<'_>) -> Result<CallOutput, FactoryError>;
}

/// Factory trait for deploying implementation instances
pub trait LogicFactory: Send + Sync {
    /// Create a new instance of the implementation
    fn deploy(&self) -> Box<dyn FactoryLogic>;

    /// Get the name of the implementation this factory deploys
    fn logic_name(&self) -> &str;
}
