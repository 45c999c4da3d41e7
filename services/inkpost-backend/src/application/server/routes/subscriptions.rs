use axum::extract::{Json, State};
use axum::http::header::ORIGIN;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use common::err_context::ErrorContextExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Error;
use crate::application::server::AppState;
use crate::domain::{NewSubscription, SubscriptionRequest};

/// POST handler for newsletter subscriptions.
/// A request with an address already present in the directory is a
/// silent success, so the endpoint does not leak who is subscribed.
#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(state, headers, request),
    fields(
        request_id = %Uuid::new_v4(),
    )
)]
pub async fn subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SubscriptionRequest>,
) -> Result<impl IntoResponse, Error> {
    check_origin(&headers, &state.allowed_origins)?;

    let caller = caller_address(&headers);
    if !state.limiter.check(&caller) {
        return Err(Error::RateLimited {
            context: "Too many subscription requests".to_string(),
        });
    }

    let subscription =
        NewSubscription::try_from(request).map_err(|err| Error::InvalidRequest { context: err })?;

    let existing = state
        .storage
        .get_subscription_by_email(subscription.email.as_ref())
        .await
        .context("Could not check for an existing subscription")?;

    if existing.is_some() {
        tracing::info!("Duplicate subscription for {}", subscription.email);
        return Ok(Json(SubscriptionResp { ok: true }));
    }

    state
        .storage
        .create_subscription(&subscription)
        .await
        .context("Could not store new subscription")?;

    Ok(Json(SubscriptionResp { ok: true }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResp {
    pub ok: bool,
}

/// The caller is identified by the forwarded client address; behind no
/// proxy every caller shares one bucket, which is still a usable ceiling.
fn caller_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn check_origin(headers: &HeaderMap, allowed_origins: &[String]) -> Result<(), Error> {
    if allowed_origins.is_empty() {
        return Ok(());
    }
    let origin = headers.get(ORIGIN).and_then(|value| value.to_str().ok());
    match origin {
        Some(origin) if allowed_origins.iter().any(|allowed| allowed == origin) => Ok(()),
        _ => Err(Error::Forbidden {
            context: "Origin is not allowed to subscribe".to_string(),
        }),
    }
}
