use axum::extract::{Json, State};
use axum::response::IntoResponse;
use common::err_context::ErrorContextExt;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Error;
use crate::application::server::{AppState, ApplicationBaseUrl};
use crate::authentication::issue_unsubscribe_token;
use crate::domain::ports::secondary::{Email, SubscriberStorage};
use crate::domain::{DispatchFailure, DispatchOutcome, PostMeta, SubscriberEmail};

/// POST handler for newsletter dispatch.
///
/// Preconditions are fatal: wrong secret, missing slug, unknown post, or
/// a page without a metadata block all reject the request before any
/// email goes out. Once the loop starts, a refused recipient is recorded
/// and skipped, and the run continues to the end.
#[tracing::instrument(
    name = "Dispatching a newsletter",
    skip(state, request),
    fields(
        request_id = %Uuid::new_v4(),
    )
)]
pub async fn publish_newsletter(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<impl IntoResponse, Error> {
    if request.secret.as_deref() != Some(state.api_secret.expose_secret().as_str()) {
        return Err(Error::Unauthorized {
            context: "Invalid newsletter secret".to_string(),
        });
    }

    let slug = request
        .slug
        .filter(|slug| !slug.trim().is_empty())
        .ok_or_else(|| Error::InvalidRequest {
            context: "Missing slug".to_string(),
        })?;

    let page = state
        .pages
        .get_post_page(&slug)
        .await
        .context("Could not fetch the rendered post page")?
        .ok_or_else(|| Error::NotFound {
            context: format!("No published post for slug {slug}"),
        })?;

    let meta = PostMeta::parse(&page).ok_or_else(|| Error::InvalidRequest {
        context: "no metadata found".to_string(),
    })?;

    let recipients = list_active_subscribers(&*state.storage, state.page_size).await;

    if recipients.is_empty() {
        return Ok(Json(PublishResp {
            ok: true,
            sent: 0,
            failed: 0,
            errors: vec![],
            message: Some("no active subscribers".to_string()),
        }));
    }

    let mut outcome = DispatchOutcome::default();
    for recipient in recipients {
        let email = newsletter_email(
            &recipient,
            &slug,
            &meta,
            &state.base_url,
            &state.site_url,
            state.unsubscribe_secret.as_ref(),
        );
        match state.email.send_email(email).await {
            Ok(()) => outcome.record_sent(),
            Err(err) => {
                tracing::warn!("Could not send newsletter to {recipient}: {err}");
                outcome.record_failure(recipient.as_ref(), &err.to_string());
            }
        }
        // The delivery service enforces a request-rate ceiling, so we
        // pause after every send, failed ones included.
        tokio::time::sleep(state.send_interval).await;
    }

    tracing::info!(
        sent = outcome.sent,
        failed = outcome.failed,
        "Newsletter dispatch complete for {slug}"
    );

    Ok(Json(PublishResp {
        ok: true,
        sent: outcome.sent,
        failed: outcome.failed,
        errors: outcome.errors,
        message: None,
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub slug: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResp {
    pub ok: bool,
    pub sent: u64,
    pub failed: u64,
    pub errors: Vec<DispatchFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Collects every active address by following the directory's
/// continuation cursor. A failure mid-scan ends the scan but keeps what
/// was accumulated: an under-delivered newsletter beats a failed one.
/// The shortfall is reported in the logs rather than silently dropped.
pub(crate) async fn list_active_subscribers(
    storage: &(dyn SubscriberStorage + Send + Sync),
    page_size: i64,
) -> Vec<SubscriberEmail> {
    let mut emails = Vec::new();
    let mut cursor = None;
    loop {
        match storage.get_active_subscribers_page(cursor, page_size).await {
            Ok(page) => {
                emails.extend(page.emails);
                match page.next {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    collected = emails.len(),
                    "Subscriber directory scan ended early"
                );
                break;
            }
        }
    }
    emails
}

/// Builds the message for one recipient: the post title and description,
/// tag badges, a link to the post, and a personal unsubscribe link with
/// a freshly computed token.
fn newsletter_email(
    to: &SubscriberEmail,
    slug: &str,
    meta: &PostMeta,
    base_url: &ApplicationBaseUrl,
    site_url: &str,
    unsubscribe_secret: Option<&Secret<String>>,
) -> Email {
    let title = meta.title().unwrap_or(slug);
    let description = meta.description().unwrap_or("");
    let post_url = format!("{site_url}/posts/{slug}");

    let token_query = unsubscribe_secret
        .map(|secret| format!("&token={}", issue_unsubscribe_token(secret, to.as_ref())))
        .unwrap_or_default();
    // The address goes through a query string decoder on the way back, so
    // it must be form-encoded here or a '+' in the local part turns into
    // a space and the link stops matching the subscriber.
    let encoded_email: String =
        url::form_urlencoded::byte_serialize(to.as_ref().as_bytes()).collect();
    let unsubscribe_url =
        format!("{base_url}/api/v1/unsubscribe?email={encoded_email}{token_query}");

    let badges: String = meta
        .tags()
        .iter()
        .map(|tag| format!(r#"<span class="tag">{tag}</span> "#))
        .collect();

    let html_content = format!(
        r#"<h1><a href="{post_url}">{title}</a></h1>
<p>{description}</p>
<p>{badges}</p>
<p><a href="{unsubscribe_url}">Unsubscribe</a></p>
"#
    );
    let text_content = format!(
        "{title}\n\n{description}\n\nRead it here: {post_url}\n\nUnsubscribe: {unsubscribe_url}\n"
    );

    Email {
        to: to.clone(),
        subject: title.to_string(),
        html_content,
        text_content,
    }
}
