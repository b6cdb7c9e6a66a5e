use std::time::Duration;

use crate::identity::WebhookUrl;
use crate::protocol::DigitResponse;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("webhook {url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("decode response of {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Calls the webhooks exposed by the phone side. All calls are plain GETs.
#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn get(&self, url: &WebhookUrl) -> Result<reqwest::Response, WebhookError> {
        let response = self
            .http
            .get(url.as_url().clone())
            .send()
            .await
            .map_err(|source| WebhookError::Request {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(WebhookError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    /// Asks the caller for the next digit. Blocks until the phone side answers.
    pub async fn fetch_digit(&self, url: &WebhookUrl) -> Result<i64, WebhookError> {
        let response = self.get(url).await?;
        let body: DigitResponse = response.json().await.map_err(|source| WebhookError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok(body.digit)
    }

    /// Fire a notification whose response does not matter. Failures are logged.
    pub async fn notify(&self, url: &WebhookUrl) {
        if let Err(e) = self.get(url).await {
            tracing::warn!(webhook = %url, http_method = "GET", error = %e, "failed HTTP request to webhook");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::WebhookStub;

    #[tokio::test]
    async fn fetch_digit_decodes_json_body() {
        let stub = WebhookStub::start(vec![4]).await;
        let client = WebhookClient::new(Duration::from_secs(5)).unwrap();

        let digit = client.fetch_digit(&stub.webhooks("a").select_digit).await.unwrap();

        assert_eq!(digit, 4);
    }

    #[tokio::test]
    async fn fetch_digit_fails_on_error_status() {
        let stub = WebhookStub::start(vec![]).await;
        let client = WebhookClient::new(Duration::from_secs(5)).unwrap();

        let result = client.fetch_digit(&stub.webhooks("a").select_digit).await;

        assert!(matches!(result, Err(WebhookError::Status { .. })));
    }

    #[tokio::test]
    async fn notify_swallows_connection_errors() {
        let client = WebhookClient::new(Duration::from_secs(1)).unwrap();
        let url = WebhookUrl::parse("http://127.0.0.1:1/done").unwrap();
        client.notify(&url).await;
    }
}
