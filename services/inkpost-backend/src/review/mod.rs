/// Design review of a live page.
///
/// Takes a screenshot of the page through a rendering service, then
/// sends the capture to a vision model and returns its critique as
/// plain text.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::err_context::{ErrorContext, ErrorContextExt};
use common::settings::ReviewSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http {
        context: String,
        source: reqwest::Error,
    },
    Response {
        context: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http { context, source } => {
                write!(fmt, "Review HTTP Error: {context} | {source}")
            }
            Error::Response { context } => {
                write!(fmt, "Review Response Error: {context}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<reqwest::Error>> for Error {
    fn from(err: ErrorContext<reqwest::Error>) -> Self {
        Error::Http {
            context: err.0,
            source: err.1,
        }
    }
}

const REVIEW_PROMPT: &str = "You are a design reviewer. Critique the layout, typography, \
spacing and color of this page. Be specific and actionable.";

#[derive(Debug, Serialize)]
struct VisionRequest {
    model: String,
    messages: Vec<VisionMessage>,
}

#[derive(Debug, Serialize)]
struct VisionMessage {
    role: String,
    content: Vec<VisionContent>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VisionContent {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    choices: Vec<VisionChoice>,
}

#[derive(Debug, Deserialize)]
struct VisionChoice {
    message: VisionReply,
}

#[derive(Debug, Deserialize)]
struct VisionReply {
    content: String,
}

pub async fn run_review(settings: &ReviewSettings, url: &str) -> Result<String, Error> {
    let client = Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .context("Could not build the review http client".to_string())?;

    let screenshot = capture(&client, &settings.screenshot_url, url).await?;
    tracing::info!("Captured {} bytes for {url}", screenshot.len());
    critique(&client, settings, &screenshot).await
}

async fn capture(client: &Client, screenshot_url: &str, url: &str) -> Result<Vec<u8>, Error> {
    let bytes = client
        .get(screenshot_url)
        .query(&[("url", url)])
        .send()
        .await
        .context(format!("Could not reach screenshot service for {url}"))?
        .error_for_status()
        .context(format!("Screenshot service refused {url}"))?
        .bytes()
        .await
        .context("Could not read the screenshot body".to_string())?;
    Ok(bytes.to_vec())
}

async fn critique(
    client: &Client,
    settings: &ReviewSettings,
    screenshot: &[u8],
) -> Result<String, Error> {
    let data_url = format!("data:image/png;base64,{}", STANDARD.encode(screenshot));
    let request = VisionRequest {
        model: settings.model.clone(),
        messages: vec![VisionMessage {
            role: "user".to_string(),
            content: vec![
                VisionContent::Text {
                    text: REVIEW_PROMPT.to_string(),
                },
                VisionContent::ImageUrl {
                    image_url: ImageUrl { url: data_url },
                },
            ],
        }],
    };

    let response: VisionResponse = client
        .post(&settings.vision_url)
        .bearer_auth(&settings.api_key)
        .json(&request)
        .send()
        .await
        .context("Could not reach the vision model".to_string())?
        .error_for_status()
        .context("Vision model refused the review request".to_string())?
        .json()
        .await
        .context("Could not decode the vision model response".to_string())?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::Response {
            context: "Vision model returned no critique".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn review_settings(server_url: &str) -> ReviewSettings {
        ReviewSettings {
            screenshot_url: format!("{server_url}/screenshot"),
            vision_url: format!("{server_url}/v1/chat/completions"),
            api_key: "review-key".to_string(),
            model: "vision-model".to_string(),
        }
    }

    #[tokio::test]
    async fn review_should_capture_then_forward_the_critique() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/screenshot"))
            .and(query_param("url", "http://blog.example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![137, 80, 78, 71]))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer review-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Tighten the line height." } }
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let settings = review_settings(&mock_server.uri());
        let critique = run_review(&settings, "http://blog.example.com").await;

        assert_that(&critique)
            .is_ok()
            .is_equal_to("Tighten the line height.".to_string());
    }

    #[tokio::test]
    async fn a_failed_screenshot_should_not_reach_the_vision_model() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/screenshot"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let settings = review_settings(&mock_server.uri());
        let critique = run_review(&settings, "http://blog.example.com").await;

        assert_that(&critique).is_err();
    }

    #[tokio::test]
    async fn an_empty_critique_should_be_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/screenshot"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&mock_server)
            .await;

        let settings = review_settings(&mock_server.uri());
        let critique = run_review(&settings, "http://blog.example.com").await;

        assert_that(&critique).is_err();
    }
}
