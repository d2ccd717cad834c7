use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tokenforge_core::error::FactoryError;
use tokenforge_core::id::Address;

/// Notification emitted synchronously on every successful token creation.
///
/// Ordering in the log matches call-admission order; there is no redelivery
/// beyond at-least-once per successful call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreated {
    /// The sequential identifier assigned by the registry
    pub token_id: u64,

    /// Address of the factory entry point that created the token
    pub factory: Address,

    /// Address of the created token
    pub token: Address,

    /// The principal that requested the creation
    pub creator: Address,

    pub name: String,
    pub symbol: String,
    pub initial_supply: u128,

    /// Unix timestamp at emission
    pub timestamp: i64,
}

impl TokenCreated {
    pub fn new(
        token_id: u64,
        factory: Address,
        token: Address,
        creator: Address,
        name: String,
        symbol: String,
        initial_supply: u128,
    ) -> Self {
        Self {
            token_id,
            factory,
            token,
            creator,
            name,
            symbol,
            initial_supply,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Render the event for external listeners
    pub fn to_json(&self) -> Result<String, FactoryError> {
        serde_json::to_string(self).map_err(|e| FactoryError::Serialization(e.to_string()))
    }
}

/// Iterator for traversing recorded creation events
pub trait TokenEventIterator: Iterator<Item = Result<TokenCreated, FactoryError>> {}

/// Sink for creation notifications
pub trait TokenEventLog: Send + Sync {
    /// Record an event
    ///
    /// # Parameters
    /// * `event` - The creation event to record
    ///
    /// # Returns
    /// Ok(()) if successful, Err otherwise
    fn record(&self, event: &TokenCreated) -> Result<(), FactoryError>;

    /// Get all recorded events in emission order
    fn events(&self) -> Box<dyn TokenEventIterator + '_>;

    /// Get all recorded events for tokens created by a specific principal
    ///
    /// # Parameters
    /// * `creator` - The principal to get events for
    ///
    /// # Returns
    /// An iterator that yields that principal's events in emission order
    fn events_for_creator(&self, creator: &Address) -> Box<dyn TokenEventIterator + '_>;

    /// Number of events recorded so far
    fn event_count(&self) -> usize;
}

/// In-memory implementation of the event log
pub struct InMemoryEventLog {
    // Events in emission order
    events: Mutex<Vec<TokenCreated>>,

    // Mapping from creator to indexes into the event sequence
    by_creator: Mutex<HashMap<Address, Vec<usize>>>,
}

impl InMemoryEventLog {
    /// Create a new in-memory event log
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            by_creator: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator implementation for recorded events
pub struct InMemoryEventIterator {
    events: Vec<TokenCreated>,
    current_index: usize,
}

impl Iterator for InMemoryEventIterator {
    type Item = Result<TokenCreated, FactoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index < self.events.len() {
            let event = self.events[self.current_index].clone();
            self.current_index += 1;
            Some(Ok(event))
        } else {
            None
        }
    }
}

impl TokenEventIterator for InMemoryEventIterator {}

impl TokenEventLog for InMemoryEventLog {
    fn record(&self, event: &TokenCreated) -> Result<(), FactoryError> {
        // Append in emission order
        let index = {
            let mut events = self.events.lock().unwrap();
            events.push(event.clone());
            events.len() - 1
        };

        // Index the event by its creator
        {
            let mut by_creator = self.by_creator.lock().unwrap();
            by_creator.entry(event.creator).or_default().push(index);
        }

        Ok(())
    }

    fn events(&self) -> Box<dyn TokenEventIterator + '_> {
        let events = self.events.lock().unwrap().clone();
        Box::new(InMemoryEventIterator {
            events,
            current_index: 0,
        })
    }

    fn events_for_creator(&self, creator: &Address) -> Box<dyn TokenEventIterator + '_> {
        let indexes = {
            let by_creator = self.by_creator.lock().unwrap();
            by_creator.get(creator).cloned().unwrap_or_default()
        };

        let events = {
            let events = self.events.lock().unwrap();
            indexes
                .iter()
                .filter_map(|i| events.get(*i).cloned())
                .collect()
        };

        Box::new(InMemoryEventIterator {
            events,
            current_index: 0,
        })
    }

    fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}
