/// Interface to the public site serving rendered post pages.
use async_trait::async_trait;
use common::err_context::ErrorContext;
use serde::Serialize;
use serde_with::{serde_as, DisplayFromStr};
use std::fmt;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource {
    /// The rendered markup of the post identified by slug, or `None` when
    /// the site does not serve it (not published, or no such post).
    async fn get_post_page(&self, slug: &str) -> Result<Option<String>, Error>;
}

#[serde_as]
#[derive(Debug, Serialize)]
pub enum Error {
    /// Connection issue with the public site
    Connection {
        context: String,
        #[serde_as(as = "DisplayFromStr")]
        source: reqwest::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection { context, source } => {
                write!(fmt, "Site Connection: {context} | {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<reqwest::Error>> for Error {
    fn from(err: ErrorContext<reqwest::Error>) -> Self {
        Error::Connection {
            context: err.0,
            source: err.1,
        }
    }
}
