//! Test event stores and checkpoint stores.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use leaderview_core::error::DomainError;
use leaderview_core::event::{Event, EventWithVersion, Operation};
use leaderview_core::repository::{EventStore, SubscriptionStateRepository};
use leaderview_core::subscription::SubscriptionState;

/// An event store holding its log in memory. Versions start at 1 and
/// increase by one per appended event.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<EventWithVersion>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose log already contains `events`, versioned 1..=n.
    #[must_use]
    pub fn with_events(events: Vec<Event>) -> Self {
        let store = Self::new();
        {
            let mut log = store.events.lock().unwrap();
            for event in events {
                let version = log.len() as i64 + 1;
                log.push(EventWithVersion { version, event });
            }
        }
        store
    }

    /// Returns a snapshot of the whole log.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<EventWithVersion> {
        self.events.lock().unwrap().clone()
    }

    /// Empties the log.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn save(&self, event: Event) -> Result<Operation, DomainError> {
        let mut log = self.events.lock().unwrap();
        let version = log.len() as i64 + 1;
        let operation = Operation {
            id: event.operation_id.clone(),
            aggregate_root: event.aggregate_root.clone(),
            event_type: event.event_data.event_type().to_owned(),
            version,
        };
        log.push(EventWithVersion { version, event });
        Ok(operation)
    }

    async fn get_events(
        &self,
        from_version_exclusive: i64,
    ) -> Result<Vec<EventWithVersion>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.version > from_version_exclusive)
            .cloned()
            .collect())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn save(&self, _event: Event) -> Result<Operation, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn get_events(
        &self,
        _from_version_exclusive: i64,
    ) -> Result<Vec<EventWithVersion>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// Subscription checkpoints held in memory, keyed by subscription name.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStates {
    states: Mutex<HashMap<String, SubscriptionState>>,
    writes: Mutex<Vec<(String, SubscriptionState)>>,
}

impl InMemorySubscriptionStates {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store where `name` is already registered with `state`.
    #[must_use]
    pub fn with_state(name: &str, state: SubscriptionState) -> Self {
        let store = Self::new();
        store
            .states
            .lock()
            .unwrap()
            .insert(name.to_owned(), state);
        store
    }

    /// Returns every state written through `save`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> Vec<(String, SubscriptionState)> {
        self.writes.lock().unwrap().clone()
    }

    /// Forgets every subscription.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.states.lock().unwrap().clear();
        self.writes.lock().unwrap().clear();
    }
}

#[async_trait]
impl SubscriptionStateRepository for InMemorySubscriptionStates {
    async fn get(&self, name: &str) -> Result<Option<SubscriptionState>, DomainError> {
        Ok(self.states.lock().unwrap().get(name).cloned())
    }

    async fn save(&self, name: &str, state: &SubscriptionState) -> Result<(), DomainError> {
        self.states
            .lock()
            .unwrap()
            .insert(name.to_owned(), state.clone());
        self.writes
            .lock()
            .unwrap()
            .push((name.to_owned(), state.clone()));
        Ok(())
    }
}
