//! Shared test fakes and utilities for the Leaderview stat tracker.
//!
//! The in-memory repositories are arenas keyed by primary key. Each exposes
//! `clear()` and a `with_state()`-style seeding constructor.

mod banks;
mod clock;
mod data_cache;
mod entities;
mod events;
mod views;

pub use banks::{RecordingSynchronizer, StubResolver};
pub use clock::FixedClock;
pub use data_cache::InMemoryDataCacheRepository;
pub use entities::InMemoryEntityRepository;
pub use events::{FailingEventStore, InMemoryEventStore, InMemorySubscriptionStates};
pub use views::InMemoryViewsRepository;
