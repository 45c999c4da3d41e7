use async_trait::async_trait;
use common::err_context::ErrorContextExt;
use common::settings::EmailClientSettings;
use reqwest::Client;
use serde::Serialize;

use crate::domain::ports::secondary::{Email, EmailError as Error, EmailService};
use crate::domain::SubscriberEmail;

#[derive(Debug, Clone)]
pub struct EmailClient {
    // This is the client end of a connection to an email service API.
    http_client: Client,
    // This is the URL of the Email server
    server_url: String,
    // This is the sender of the email sent to the end user.
    sender: SubscriberEmail,
    authorization_token: String,
}

impl EmailClient {
    pub async fn new(settings: EmailClientSettings) -> Result<EmailClient, Error> {
        let sender =
            SubscriberEmail::parse(settings.sender_email).map_err(|err| Error::Configuration {
                context: format!("Could not parse Email Client Service Sender: {err}"),
            })?;
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout))
            .build()
            .map_err(|err| Error::Configuration {
                context: format!("Could not build the email http client: {err}"),
            })?;
        Ok(EmailClient {
            http_client,
            server_url: settings.server_url,
            sender,
            authorization_token: settings.authorization_token,
        })
    }
}

#[async_trait]
impl EmailService for EmailClient {
    async fn send_email(&self, email: Email) -> Result<(), Error> {
        let Email {
            to,
            subject,
            html_content,
            text_content,
        } = email;

        let url = format!("{}/email", self.server_url);

        let request_body = SendEmailRequest {
            to: to.as_ref(),
            from: self.sender.as_ref(),
            subject: &subject,
            html_content: &html_content,
            text_content: &text_content,
        };

        self.http_client
            .post(&url)
            .header("X-Postmark-Server-Token", &self.authorization_token)
            .json(&request_body)
            .send()
            .await
            .context("http client request to email service".to_string())?
            .error_for_status()
            .context("http client response".to_string())?;

        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}
