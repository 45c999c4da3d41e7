/// This module holds the webserver specific details,
/// in our case all (most?) the axum related code.
pub mod rate_limit;
pub mod routes;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{IntoMakeService, Router},
    Server,
};
use hyper::server::conn::AddrIncoming;
use secrecy::Secret;
use std::time::Duration;
use std::{fmt, net::TcpListener};
use std::{fmt::Display, sync::Arc};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use self::rate_limit::RateLimiter;
use crate::domain::ports::secondary::{EmailService, PageSource, SubscriberStorage};
use common::err_context::{ErrorContext, ErrorContextExt};

pub fn new(listener: TcpListener, state: AppState) -> Result<AppServer, Error> {
    let cors = if state.allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid allowed origin: {origin}");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
    };

    let app = Router::new()
        .merge(routes::routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start the axum server and set up to use supplied listener
    let server = axum::Server::from_tcp(listener)
        .context("Could not create server from listener".to_string())?
        .serve(app.into_make_service());

    Ok(server)
}

pub type DynStorage = Arc<dyn SubscriberStorage + Send + Sync>;
pub type DynEmail = Arc<dyn EmailService + Send + Sync>;
pub type DynPages = Arc<dyn PageSource + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub storage: DynStorage,
    pub email: DynEmail,
    pub pages: DynPages,
    /// Public URL of this service, base for unsubscribe links.
    pub base_url: ApplicationBaseUrl,
    /// URL of the public blog, used in rendered messages and pages.
    pub site_url: String,
    /// Shared secret gating the send-newsletter endpoint.
    pub api_secret: Secret<String>,
    /// Secret keying unsubscribe tokens; absence disables verification.
    pub unsubscribe_secret: Option<Secret<String>>,
    pub send_interval: Duration,
    pub page_size: i64,
    pub allowed_origins: Vec<String>,
    pub limiter: Arc<RateLimiter>,
}

pub type AppServer = Server<AddrIncoming, IntoMakeService<Router>>;

#[derive(Clone)]
pub struct ApplicationBaseUrl(pub String);

impl Display for ApplicationBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub enum Error {
    Server {
        context: String,
        source: hyper::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Server { context, source } => {
                write!(fmt, "Server: {context} | {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<hyper::Error>> for Error {
    fn from(err: ErrorContext<hyper::Error>) -> Self {
        Error::Server {
            context: err.0,
            source: err.1,
        }
    }
}
