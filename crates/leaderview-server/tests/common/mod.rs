//! Shared test helpers for server integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use leaderview_persistence::PgSubscriptionRepository;
use sqlx::PgPool;
use tower::ServiceExt;

use leaderview_server::routes;
use leaderview_server::state::AppState;

/// Subscriptions the test app reports on.
pub const SUBSCRIPTIONS: [&str; 4] = ["views", "wow-sync", "wow-hardcore-sync", "lol-sync"];

/// Build the full app router over a real `PgSubscriptionRepository`. Uses
/// the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let app_state = AppState::new(
        Arc::new(PgSubscriptionRepository::new(pool)),
        SUBSCRIPTIONS.iter().map(|s| (*s).to_owned()).collect(),
    );

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/subscriptions", routes::subscriptions::router())
        .with_state(app_state)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
