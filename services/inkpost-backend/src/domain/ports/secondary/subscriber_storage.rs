use async_trait::async_trait;
use common::err_context::ErrorContext;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;
use uuid::Uuid;

use crate::domain::{NewSubscription, SubscriberEmail, Subscription, SubscriptionStatus};

/// One page of the subscriber directory scan. `next` is the continuation
/// cursor; `None` means the store reported no further pages.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberPage {
    pub emails: Vec<SubscriberEmail>,
    pub next: Option<Uuid>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriberStorage {
    /// Store a new subscription with status 'active' and return it.
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, Error>;

    async fn get_subscription_by_email(&self, email: &str) -> Result<Option<Subscription>, Error>;

    /// Modify the status of the subscriber identified by id.
    async fn set_subscription_status(
        &self,
        id: &Uuid,
        status: SubscriptionStatus,
    ) -> Result<(), Error>;

    /// One bounded page of active subscriber addresses, starting after
    /// the given cursor, in store order.
    async fn get_active_subscribers_page(
        &self,
        cursor: Option<Uuid>,
        limit: i64,
    ) -> Result<SubscriberPage, Error>;
}

#[serde_as]
#[derive(Debug, Serialize)]
pub enum Error {
    /// Error returned by sqlx
    Database {
        context: String,
        #[serde_as(as = "DisplayFromStr")]
        source: sqlx::Error,
    },
    /// Data store cannot be validated
    Validation {
        context: String,
    },
    /// Connection issue with the database
    Connection {
        context: String,
        #[serde_as(as = "DisplayFromStr")]
        source: sqlx::Error,
    },
    Configuration {
        context: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database { context, source } => {
                write!(fmt, "Database: {context} | {source}")
            }
            Error::Validation { context } => {
                write!(fmt, "Data: {context}")
            }
            Error::Connection { context, source } => {
                write!(fmt, "Database Connection: {context} | {source}")
            }
            Error::Configuration { context } => {
                write!(fmt, "Database Configuration: {context}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<sqlx::Error>> for Error {
    fn from(err: ErrorContext<sqlx::Error>) -> Self {
        match err.1 {
            sqlx::Error::PoolTimedOut => Error::Connection {
                context: format!("PostgreSQL Storage: Connection Timeout: {}", err.0),
                source: err.1,
            },
            sqlx::Error::Database(_) => Error::Database {
                context: format!("PostgreSQL Storage: Database: {}", err.0),
                source: err.1,
            },
            _ => Error::Connection {
                context: format!(
                    "PostgreSQL Storage: Could not establish a connection: {}",
                    err.0
                ),
                source: err.1,
            },
        }
    }
}
