//! Leaderview server entry point.

use std::sync::Arc;

use axum::Router;
use leaderview_core::clock::{Clock, SystemClock};
use leaderview_core::entity::Game;
use leaderview_core::repository::{
    DataCacheRepository, EntityRepository, EventStore, SubscriptionStateRepository,
    ViewsRepository,
};
use leaderview_core::resolver::ResolverBank;
use leaderview_core::synchronizer::SynchronizerBank;
use leaderview_lol::{
    HttpRiotClient, LolEntityResolver, LolEntitySynchronizer, LolEntityUpdater, RiotClient,
};
use leaderview_persistence::schema::MIGRATOR;
use leaderview_persistence::{
    PgDataCacheRepository, PgEntityRepository, PgEventStore, PgSubscriptionRepository,
    PgViewsRepository,
};
use leaderview_server::config::ServerConfig;
use leaderview_server::error::AppError;
use leaderview_server::maintenance::{DataCacheSweep, MaintenanceJob, MaintenanceRunner};
use leaderview_server::routes;
use leaderview_server::state::AppState;
use leaderview_server::telemetry;
use leaderview_subscriptions::{EventProcessor, EventSubscription, SubscriptionRunner};
use leaderview_views::application::entity_materializer::EntityMaterializer;
use leaderview_views::application::guild_roster_updater::GuildRosterUpdater;
use leaderview_views::application::sync_processor::EntitySyncProcessor;
use leaderview_views::application::view_processor::ViewProcessor;
use leaderview_wow::{
    BlizzardClient, HttpBlizzardClient, HttpRaiderIoClient, RaiderIoClient, WowEntityResolver,
    WowEntitySynchronizer, WowHardcoreEntitySynchronizer,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ServerConfig::from_env()?;
    let _telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Leaderview server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    MIGRATOR.run(&pool).await?;

    // Repositories.
    let event_store: Arc<dyn EventStore> = Arc::new(PgEventStore::new(pool.clone()));
    let subscription_states: Arc<dyn SubscriptionStateRepository> =
        Arc::new(PgSubscriptionRepository::new(pool.clone()));
    let entities: Arc<dyn EntityRepository> = Arc::new(PgEntityRepository::new(pool.clone()));
    let views: Arc<dyn ViewsRepository> = Arc::new(PgViewsRepository::new(pool.clone()));
    let cache: Arc<dyn DataCacheRepository> = Arc::new(PgDataCacheRepository::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // External API clients.
    let riot: Arc<dyn RiotClient> =
        Arc::new(HttpRiotClient::new(config.riot.clone(), config.client_retry));
    let blizzard: Arc<dyn BlizzardClient> =
        Arc::new(HttpBlizzardClient::new(config.blizzard.clone(), config.client_retry));
    let raider_io: Arc<dyn RaiderIoClient> =
        Arc::new(HttpRaiderIoClient::new(config.raider_io.clone(), config.client_retry));

    // Per-game strategies.
    let resolvers = ResolverBank::new(
        Arc::new(WowEntityResolver::retail(blizzard.clone(), entities.clone())),
        Arc::new(WowEntityResolver::hardcore(blizzard.clone(), entities.clone())),
        Arc::new(LolEntityResolver::new(riot.clone(), entities.clone())),
    );
    let synchronizers = SynchronizerBank::new(
        Arc::new(WowEntitySynchronizer::new(raider_io, cache.clone(), clock.clone())),
        Arc::new(WowHardcoreEntitySynchronizer::new(
            blizzard,
            cache.clone(),
            clock.clone(),
        )),
        Arc::new(LolEntitySynchronizer::new(riot.clone(), cache.clone(), clock.clone())),
    );
    let materializer = EntityMaterializer::new(entities.clone());

    // Event subscriptions.
    let sync_processor = |game: Game| -> Arc<dyn EventProcessor> {
        Arc::new(EntitySyncProcessor::new(
            game,
            views.clone(),
            entities.clone(),
            synchronizers.clone(),
        ))
    };
    let view_processor: Arc<dyn EventProcessor> = Arc::new(ViewProcessor::new(
        resolvers.clone(),
        materializer.clone(),
        views.clone(),
        event_store.clone(),
    ));
    let processors = vec![
        ("views", view_processor),
        ("wow-sync", sync_processor(Game::Wow)),
        ("wow-hardcore-sync", sync_processor(Game::WowHc)),
        ("lol-sync", sync_processor(Game::Lol)),
    ];
    let subscription_names = processors.iter().map(|(name, _)| (*name).to_owned()).collect();
    let subscriptions = processors
        .into_iter()
        .map(|(name, processor)| {
            EventSubscription::new(
                name,
                event_store.clone(),
                subscription_states.clone(),
                processor,
                config.subscription_backoff,
                clock.clone(),
            )
        })
        .collect();
    let subscription_runner = SubscriptionRunner::start(subscriptions, config.poll_interval);

    // Maintenance.
    let jobs: Vec<Arc<dyn MaintenanceJob>> = vec![
        Arc::new(LolEntityUpdater::new(riot, entities.clone())),
        Arc::new(GuildRosterUpdater::new(
            resolvers,
            materializer,
            views.clone(),
            cache.clone(),
        )),
        Arc::new(DataCacheSweep::new(cache, clock, config.data_cache_ttl)),
    ];
    let maintenance = MaintenanceRunner::start(jobs, config.maintenance_interval);

    // Build router.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/subscriptions", routes::subscriptions::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(subscription_states, subscription_names));

    // Start server.
    let addr = config.bind_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping background tasks");
    subscription_runner.shutdown().await;
    maintenance.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
