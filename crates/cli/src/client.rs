//! API client for a running stackmon agent

use anyhow::{Context, Result};
use monitor_lib::{HealthAssessment, HealthReport, QuickStatus, Target};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// API client for the agent HTTP API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn quick_status(&self) -> Result<QuickStatus> {
        self.get("status").await
    }

    pub async fn assessment(&self, signals: bool) -> Result<HealthAssessment> {
        self.get(&format!("assessment?signals={signals}")).await
    }

    pub async fn report(&self, signals: bool) -> Result<HealthReport> {
        self.get(&format!("report?signals={signals}")).await
    }

    pub async fn targets(&self) -> Result<Vec<Target>> {
        self.get("targets").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_lib::{HealthLevel, StatusLabel};

    #[tokio::test]
    async fn test_quick_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"services_available":3,"services_total":4,"containers_running":4,
                    "containers_expected":4,"containers_observed":4,
                    "expectation_configured":true,"elapsed":87,"label":"PARTIAL"}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let status = client.quick_status().await.unwrap();

        assert_eq!(status.services_available, 3);
        assert_eq!(status.label, StatusLabel::Partial);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_assessment_passes_signals_flag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/assessment")
            .match_query(mockito::Matcher::UrlEncoded("signals".into(), "true".into()))
            .with_status(200)
            .with_body(
                r#"{"score":62,"level":"DEGRADED","confidence":"full",
                    "contributing_factors":[{"factor_name":"log_error_rate","impact":20}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let assessment = client.assessment(true).await.unwrap();

        assert_eq!(assessment.score, 62);
        assert_eq!(assessment.level, HealthLevel::Degraded);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_surfaces_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/targets")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.targets().await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
