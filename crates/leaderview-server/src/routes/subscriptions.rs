//! Subscription checkpoint status.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use leaderview_core::error::DomainError;
use leaderview_core::subscription::SubscriptionState;
use serde::Serialize;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Checkpoint of one subscription.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub name: String,
    /// `None` until the subscription has registered.
    pub state: Option<SubscriptionState>,
}

/// GET /
#[instrument(skip(state))]
async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubscriptionStatusResponse>>, ApiError> {
    let mut statuses = Vec::with_capacity(state.subscriptions.len());
    for name in state.subscriptions.iter() {
        statuses.push(SubscriptionStatusResponse {
            name: name.clone(),
            state: state.subscription_states.get(name).await?,
        });
    }
    Ok(Json(statuses))
}

/// GET /{name}
#[instrument(skip(state))]
async fn get_subscription(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SubscriptionStatusResponse>, ApiError> {
    let checkpoint = state
        .subscription_states
        .get(&name)
        .await?
        .ok_or_else(|| DomainError::SubscriptionNotRegistered(name.clone()))?;

    Ok(Json(SubscriptionStatusResponse {
        name,
        state: Some(checkpoint),
    }))
}

/// Returns the subscription status router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subscriptions))
        .route("/{name}", get(get_subscription))
}
