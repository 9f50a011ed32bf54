//! Leaderview Persistence: `PostgreSQL` implementations of the repository
//! traits in `leaderview-core`.

pub mod pg_data_cache_repository;
pub mod pg_entity_repository;
pub mod pg_event_store;
pub mod pg_subscription_repository;
pub mod pg_views_repository;
pub mod schema;

pub use pg_data_cache_repository::PgDataCacheRepository;
pub use pg_entity_repository::PgEntityRepository;
pub use pg_event_store::PgEventStore;
pub use pg_subscription_repository::PgSubscriptionRepository;
pub use pg_views_repository::PgViewsRepository;
