use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::err_context::ErrorContextExt;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use super::PostgresStorage;
use crate::domain::ports::secondary::{SubscriberPage, SubscriberStorage, SubscriptionError};
use crate::domain::{
    NewSubscription, SubscriberEmail, Subscription, SubscriptionStatus,
};

#[async_trait]
impl SubscriberStorage for PostgresStorage {
    #[tracing::instrument(name = "Storing a new subscription in postgres", skip(self))]
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, SubscriptionError> {
        let id = Uuid::new_v4();
        let subscribed_at = Utc::now();
        sqlx::query(
            r#"INSERT INTO subscriptions (id, email, status, subscribed_at) VALUES ($1, $2, $3, $4)"#,
        )
        .bind(id)
        .bind(subscription.email.as_ref())
        .bind(SubscriptionStatus::Active.as_str())
        .bind(subscribed_at)
        .execute(&self.pool)
        .await
        .context(format!(
            "Could not store new subscription for {}",
            subscription.email.as_ref()
        ))?;

        Ok(Subscription {
            id,
            email: subscription.email.clone(),
            status: SubscriptionStatus::Active,
            subscribed_at,
        })
    }

    #[tracing::instrument(name = "Fetching a subscription by email in postgres", skip(self))]
    async fn get_subscription_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscription>, SubscriptionError> {
        let saved = sqlx::query(
            r#"SELECT id, email, status, subscribed_at FROM subscriptions WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context(format!("Could not get subscription for {email}"))?;

        saved.map(|row| subscription_from_row(&row)).transpose()
    }

    #[tracing::instrument(name = "Updating a subscription status in postgres", skip(self))]
    async fn set_subscription_status(
        &self,
        id: &Uuid,
        status: SubscriptionStatus,
    ) -> Result<(), SubscriptionError> {
        sqlx::query(r#"UPDATE subscriptions SET status = $1 WHERE id = $2"#)
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .context(format!("Could not set status {status} for subscriber {id}"))?;
        Ok(())
    }

    #[tracing::instrument(name = "Fetching a page of active subscribers in postgres", skip(self))]
    async fn get_active_subscribers_page(
        &self,
        cursor: Option<Uuid>,
        limit: i64,
    ) -> Result<SubscriberPage, SubscriptionError> {
        // Keyset pagination: rows come back in id order, and the cursor is
        // the last id of the previous page.
        let rows = match cursor {
            Some(cursor) => {
                sqlx::query(
                    r#"SELECT id, email FROM subscriptions WHERE status = $1 AND id > $2 ORDER BY id LIMIT $3"#,
                )
                .bind(SubscriptionStatus::Active.as_str())
                .bind(cursor)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"SELECT id, email FROM subscriptions WHERE status = $1 ORDER BY id LIMIT $2"#,
                )
                .bind(SubscriptionStatus::Active.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Could not get a page of active subscribers")?;

        let next = if rows.len() == limit as usize {
            rows.last()
                .map(|row| row.try_get::<Uuid, _>("id"))
                .transpose()
                .context("Could not read the id of the last row".to_string())?
        } else {
            None
        };

        let emails = rows
            .into_iter()
            .map(|row| {
                let email: String = row
                    .try_get("email")
                    .context("Could not read the email column".to_string())?;
                SubscriberEmail::parse(email).map_err(|err| SubscriptionError::Validation {
                    context: format!("Invalid email stored in the database: {err}"),
                })
            })
            .collect::<Result<Vec<_>, SubscriptionError>>()?;

        Ok(SubscriberPage { emails, next })
    }
}

fn subscription_from_row(row: &PgRow) -> Result<Subscription, SubscriptionError> {
    let id: Uuid = row
        .try_get("id")
        .context("Could not read the id column".to_string())?;
    let email: String = row
        .try_get("email")
        .context("Could not read the email column".to_string())?;
    let status: String = row
        .try_get("status")
        .context("Could not read the status column".to_string())?;
    let subscribed_at: DateTime<Utc> = row
        .try_get("subscribed_at")
        .context("Could not read the subscribed_at column".to_string())?;

    let email = SubscriberEmail::parse(email).map_err(|err| SubscriptionError::Validation {
        context: format!("Invalid email stored in the database: {err}"),
    })?;
    let status =
        SubscriptionStatus::from_str(&status).map_err(|err| SubscriptionError::Validation {
            context: format!("Invalid status stored in the database: {err}"),
        })?;

    Ok(Subscription {
        id,
        email,
        status,
        subscribed_at,
    })
}
