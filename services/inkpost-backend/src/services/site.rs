use async_trait::async_trait;
use common::err_context::ErrorContextExt;
use reqwest::{Client, StatusCode};

use crate::domain::ports::secondary::{PageError as Error, PageSource};

/// Client for the public blog, fetching rendered post pages.
#[derive(Debug, Clone)]
pub struct SiteClient {
    http_client: Client,
    site_url: String,
}

impl SiteClient {
    pub fn new(site_url: String, timeout: std::time::Duration) -> Result<SiteClient, Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Could not build the site http client".to_string())?;
        Ok(SiteClient {
            http_client,
            site_url,
        })
    }
}

#[async_trait]
impl PageSource for SiteClient {
    async fn get_post_page(&self, slug: &str) -> Result<Option<String>, Error> {
        let url = format!("{}/posts/{}", self.site_url, slug);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("http client request to the site".to_string())?;

        // An unpublished or unknown post is not an error, callers branch on it.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response
            .error_for_status()
            .context("site response status".to_string())?
            .text()
            .await
            .context("reading the site response body".to_string())?;

        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn site_client(mock_server: &MockServer) -> SiteClient {
        SiteClient::new(mock_server.uri(), std::time::Duration::from_secs(10)).expect("site client")
    }

    #[tokio::test]
    async fn get_post_page_should_return_the_rendered_markup() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts/hello-world"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>post</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = site_client(&mock_server).await;
        let page = client.get_post_page("hello-world").await.unwrap();

        assert_that(&page).is_equal_to(Some("<html>post</html>".to_string()));
    }

    #[tokio::test]
    async fn get_post_page_should_return_none_for_an_unknown_post() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = site_client(&mock_server).await;
        let page = client.get_post_page("missing").await.unwrap();

        assert_that(&page).is_none();
    }

    #[tokio::test]
    async fn get_post_page_should_fail_on_a_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = site_client(&mock_server).await;
        let outcome = client.get_post_page("hello-world").await;

        assert_that(&outcome).is_err();
    }
}
