use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::server::AppState;
use crate::authentication::verify_unsubscribe_token;
use crate::domain::{SubscriberEmail, SubscriptionStatus};

/// GET handler for unsubscribe links.
/// Whatever happens, the subscriber clicked a link in an email, so the
/// response is always a small HTML confirmation page, never JSON.
#[tracing::instrument(
    name = "Unsubscribing a subscriber",
    skip(state, request),
    fields(
        request_id = %Uuid::new_v4(),
    )
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Query(request): Query<UnsubscribeRequest>,
) -> (StatusCode, Html<String>) {
    let email = request
        .email
        .and_then(|email| SubscriberEmail::parse(email).ok());
    let Some(email) = email else {
        return page(
            StatusCode::BAD_REQUEST,
            "Invalid request",
            "The email address is missing or invalid.",
            &state.site_url,
        );
    };

    if !verify_unsubscribe_token(
        state.unsubscribe_secret.as_ref(),
        email.as_ref(),
        request.token.as_deref(),
    ) {
        return page(
            StatusCode::FORBIDDEN,
            "Invalid link",
            "This unsubscribe link is not valid.",
            &state.site_url,
        );
    }

    let subscription = match state.storage.get_subscription_by_email(email.as_ref()).await {
        Ok(subscription) => subscription,
        Err(err) => {
            tracing::error!("Could not look up subscription: {err}");
            return failure_page(&state.site_url);
        }
    };

    let Some(subscription) = subscription else {
        return page(
            StatusCode::OK,
            "Not subscribed",
            "This address is not subscribed to the newsletter.",
            &state.site_url,
        );
    };

    match state
        .storage
        .set_subscription_status(&subscription.id, SubscriptionStatus::Unsubscribed)
        .await
    {
        Ok(()) => page(
            StatusCode::OK,
            "Unsubscribed",
            "You have been unsubscribed. Sorry to see you go.",
            &state.site_url,
        ),
        Err(err) => {
            tracing::error!("Could not update subscription status: {err}");
            failure_page(&state.site_url)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

fn failure_page(site_url: &str) -> (StatusCode, Html<String>) {
    page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong",
        "We could not process your request. Please try again later.",
        site_url,
    )
}

fn page(status: StatusCode, title: &str, text: &str, site_url: &str) -> (StatusCode, Html<String>) {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
      body {{ font-family: sans-serif; max-width: 36rem; margin: 4rem auto; }}
    </style>
  </head>
  <body>
    <h1>{title}</h1>
    <p>{text}</p>
    <p><a href="{site_url}">Back to the blog</a></p>
  </body>
</html>
"#
    );
    (status, Html(body))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::{get, Router},
    };
    use chrono::Utc;
    use mockall::predicate::*;
    use secrecy::Secret;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::{
        application::server::{rate_limit::RateLimiter, AppState, ApplicationBaseUrl},
        authentication::issue_unsubscribe_token,
        domain::ports::secondary::{MockEmailService, MockPageSource, MockSubscriberStorage},
        domain::Subscription,
    };

    use super::*;

    fn unsubscribe_route(state: AppState) -> Router {
        Router::new()
            .route("/api/v1/unsubscribe", get(unsubscribe))
            .with_state(state)
    }

    fn app_state(storage: MockSubscriberStorage) -> AppState {
        AppState {
            storage: Arc::new(storage),
            email: Arc::new(MockEmailService::new()),
            pages: Arc::new(MockPageSource::new()),
            base_url: ApplicationBaseUrl("http://127.0.0.1".to_string()),
            site_url: "http://blog.example.com".to_string(),
            api_secret: Secret::new("secret".to_string()),
            unsubscribe_secret: None,
            send_interval: Duration::from_millis(0),
            page_size: 100,
            allowed_origins: vec![],
            limiter: Arc::new(RateLimiter::new(5, Duration::from_secs(60))),
        }
    }

    fn saved_subscription(email: &str) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            email: SubscriberEmail::parse(email.to_string()).unwrap(),
            status: crate::domain::SubscriptionStatus::Active,
            subscribed_at: Utc::now(),
        }
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = hyper::body::to_bytes(response.into_body())
            .await
            .expect("response body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    fn send_unsubscribe_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("GET")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_address_should_get_a_not_subscribed_page_without_mutation() {
        let mut storage_mock = MockSubscriberStorage::new();
        storage_mock
            .expect_get_subscription_by_email()
            .with(eq("jane@example.com"))
            .return_once(|_| Ok(None));
        storage_mock.expect_set_subscription_status().never();

        let state = app_state(storage_mock);
        let app = unsubscribe_route(state);

        let response = app
            .oneshot(send_unsubscribe_request(
                "/api/v1/unsubscribe?email=jane@example.com",
            ))
            .await
            .expect("response");

        assert_that(&response.status()).is_equal_to(StatusCode::OK);
        let body = body_text(response).await;
        assert_that(&body.contains("not subscribed")).is_true();
        assert_that(&body.contains("http://blog.example.com")).is_true();
    }

    #[tokio::test]
    async fn known_address_should_be_unsubscribed() {
        let subscription = saved_subscription("jane@example.com");
        let id = subscription.id;

        let mut storage_mock = MockSubscriberStorage::new();
        storage_mock
            .expect_get_subscription_by_email()
            .with(eq("jane@example.com"))
            .return_once(move |_| Ok(Some(subscription)));
        storage_mock
            .expect_set_subscription_status()
            .withf(move |got_id: &Uuid, status: &SubscriptionStatus| {
                *got_id == id && *status == SubscriptionStatus::Unsubscribed
            })
            .return_once(|_, _| Ok(()));

        let state = app_state(storage_mock);
        let app = unsubscribe_route(state);

        let response = app
            .oneshot(send_unsubscribe_request(
                "/api/v1/unsubscribe?email=jane@example.com",
            ))
            .await
            .expect("response");

        assert_that(&response.status()).is_equal_to(StatusCode::OK);
        let body = body_text(response).await;
        assert_that(&body.contains("unsubscribed")).is_true();
    }

    #[tokio::test]
    async fn missing_email_should_get_a_bad_request_page() {
        let mut storage_mock = MockSubscriberStorage::new();
        storage_mock.expect_get_subscription_by_email().never();
        storage_mock.expect_set_subscription_status().never();

        let state = app_state(storage_mock);
        let app = unsubscribe_route(state);

        let response = app
            .oneshot(send_unsubscribe_request("/api/v1/unsubscribe"))
            .await
            .expect("response");

        assert_that(&response.status()).is_equal_to(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn a_bad_token_should_be_rejected_when_a_secret_is_configured() {
        let mut storage_mock = MockSubscriberStorage::new();
        storage_mock.expect_get_subscription_by_email().never();
        storage_mock.expect_set_subscription_status().never();

        let mut state = app_state(storage_mock);
        state.unsubscribe_secret = Some(Secret::new("s3cret".to_string()));

        let app = unsubscribe_route(state);
        let response = app
            .oneshot(send_unsubscribe_request(
                "/api/v1/unsubscribe?email=jane@example.com&token=0000000000000000",
            ))
            .await
            .expect("response");

        assert_that(&response.status()).is_equal_to(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn a_valid_token_should_be_accepted() {
        let secret = Secret::new("s3cret".to_string());
        let token = issue_unsubscribe_token(&secret, "jane@example.com");

        let subscription = saved_subscription("jane@example.com");
        let mut storage_mock = MockSubscriberStorage::new();
        storage_mock
            .expect_get_subscription_by_email()
            .return_once(move |_| Ok(Some(subscription)));
        storage_mock
            .expect_set_subscription_status()
            .return_once(|_, _| Ok(()));

        let mut state = app_state(storage_mock);
        state.unsubscribe_secret = Some(secret);

        let app = unsubscribe_route(state);
        let response = app
            .oneshot(send_unsubscribe_request(&format!(
                "/api/v1/unsubscribe?email=jane@example.com&token={token}"
            )))
            .await
            .expect("response");

        assert_that(&response.status()).is_equal_to(StatusCode::OK);
    }
}
