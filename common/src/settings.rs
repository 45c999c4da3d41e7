use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::PgConnectOptions;
use sqlx::postgres::PgSslMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Public URL of this service, used as the base for unsubscribe links.
    pub base_url: String,
    /// URL of the public blog, where rendered post pages are fetched from.
    pub site_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
    pub connection_timeout: u64,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            // Try an encrypted connection, fallback
            PgSslMode::Prefer
        };
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database_name)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailClientSettings {
    /// URL of the Email Service the client connects to.
    pub server_url: String,
    pub sender_email: String,
    pub authorization_token: String,
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterSettings {
    /// Shared secret required by the send-newsletter endpoint.
    pub api_secret: String,
    /// Secret for unsubscribe tokens. When absent, token verification
    /// is skipped and unsubscribe links are open.
    pub unsubscribe_secret: Option<String>,
    /// Pause between two sends, in milliseconds.
    pub send_interval_ms: u64,
    /// Page size used when scanning the subscriber directory.
    pub page_size: i64,
    /// Origins allowed to call the subscribe endpoint. Empty means any.
    pub allowed_origins: Vec<String>,
    /// Subscribe requests allowed per caller within the window.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Endpoint of the screenshot service rendering a page to PNG.
    pub screenshot_url: String,
    /// Chat completions endpoint of the vision model.
    pub vision_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub email_client: EmailClientSettings,
    pub newsletter: NewsletterSettings,
    pub review: Option<ReviewSettings>,
    pub mode: String,
}
