mod error;
mod listener;
pub mod opts;
pub mod server;

pub use self::error::Error;

use common::err_context::ErrorContextExt;
use common::settings::{
    ApplicationSettings, DatabaseSettings, EmailClientSettings, NewsletterSettings, Settings,
};
use secrecy::Secret;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use self::listener::listen_with_host_port;
use self::server::rate_limit::RateLimiter;
use self::server::{AppState, ApplicationBaseUrl, DynEmail, DynPages, DynStorage};
use crate::services::email::EmailClient;
use crate::services::postgres::PostgresStorage;
use crate::services::site::SiteClient;

pub struct Application {
    port: u16,
    server: server::AppServer,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), Error> {
        self.server
            .await
            .context("server execution error".to_string())?;
        Ok(())
    }
}

#[derive(Default)]
pub struct ApplicationBuilder {
    pub storage: Option<DynStorage>,
    pub email: Option<DynEmail>,
    pub pages: Option<DynPages>,
    pub listener: Option<TcpListener>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
    pub site_url: Option<String>,
    pub newsletter: Option<NewsletterSettings>,
}

impl ApplicationBuilder {
    pub async fn new(settings: Settings) -> Result<Self, Error> {
        let Settings {
            application,
            database,
            email_client,
            newsletter,
            review: _,
            mode: _,
        } = settings;
        let builder = Self::default()
            .storage(database)
            .await?
            .email(email_client)
            .await?
            .pages(application.site_url.clone())?
            .listener(application.clone())?
            .port(application.port)
            .base_url(application.base_url)
            .site_url(application.site_url)
            .newsletter(newsletter);

        Ok(builder)
    }

    pub async fn storage(mut self, settings: DatabaseSettings) -> Result<Self, Error> {
        let storage = Arc::new(
            PostgresStorage::new(settings)
                .await
                .context("Establishing a database connection".to_string())?,
        );
        self.storage = Some(storage);
        Ok(self)
    }

    pub async fn email(mut self, settings: EmailClientSettings) -> Result<Self, Error> {
        let timeout = settings.timeout;
        let email = Arc::new(
            EmailClient::new(settings)
                .await
                .context(format!("Email client with timeout {timeout}s"))?,
        );
        self.email = Some(email);
        Ok(self)
    }

    pub fn pages(mut self, site_url: String) -> Result<Self, Error> {
        let pages = Arc::new(
            SiteClient::new(site_url, Duration::from_secs(10))
                .context("Building the blog page client".to_string())?,
        );
        self.pages = Some(pages);
        Ok(self)
    }

    pub fn listener(mut self, settings: ApplicationSettings) -> Result<Self, Error> {
        let listener =
            listen_with_host_port(settings.host.as_str(), settings.port).context(format!(
                "Could not create listener for {}:{}",
                settings.host, settings.port
            ))?;
        self.listener = Some(listener);
        Ok(self)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn site_url(mut self, site_url: String) -> Self {
        self.site_url = Some(site_url);
        self
    }

    pub fn newsletter(mut self, newsletter: NewsletterSettings) -> Self {
        self.newsletter = Some(newsletter);
        self
    }

    pub fn build(self) -> Result<Application, Error> {
        let ApplicationBuilder {
            storage,
            email,
            pages,
            listener,
            port,
            base_url,
            site_url,
            newsletter,
        } = self;
        let newsletter = newsletter.expect("newsletter");
        let state = AppState {
            storage: storage.expect("storage"),
            email: email.expect("email"),
            pages: pages.expect("pages"),
            base_url: ApplicationBaseUrl(base_url.expect("base url")),
            site_url: site_url.expect("site url"),
            api_secret: Secret::new(newsletter.api_secret),
            unsubscribe_secret: newsletter.unsubscribe_secret.map(Secret::new),
            send_interval: Duration::from_millis(newsletter.send_interval_ms),
            page_size: newsletter.page_size,
            allowed_origins: newsletter.allowed_origins,
            limiter: Arc::new(RateLimiter::new(
                newsletter.rate_limit_max,
                Duration::from_secs(newsletter.rate_limit_window_secs),
            )),
        };
        let server = server::new(listener.expect("listener"), state)
            .context("Could not build application router".to_string())?;
        Ok(Application {
            port: port.expect("port"),
            server,
        })
    }
}
