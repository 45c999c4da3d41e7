mod error;
pub mod health;
pub mod newsletter;
pub mod subscriptions;
pub mod unsubscribe;

use super::AppState;
use axum::routing::{get, post, Router};

pub use self::error::Error;
use self::{
    health::health, newsletter::publish_newsletter, subscriptions::subscriptions,
    unsubscribe::unsubscribe,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/subscriptions", post(subscriptions))
        .route("/api/v1/unsubscribe", get(unsubscribe))
        .route("/api/v1/newsletter", post(publish_newsletter))
        .with_state(state)
}
