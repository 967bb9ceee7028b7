use crate::config::{EndpointConfig, HttpConfig};
use crate::errors::{CatalogError, FetchError};
use crate::fetcher::payload::rows_from_value;
use crate::fetcher::CatalogSource;
use crate::normalizer::RawRow;
use crate::records::CatalogKind;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Catalog source backed by one HTTP GET per catalog kind.
pub struct HttpCatalogSource {
    client: Client,
    endpoints: EndpointConfig,
}

impl HttpCatalogSource {
    pub fn new(endpoints: EndpointConfig, http: &HttpConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_seconds))
            .user_agent(http.user_agent.clone())
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoint(&self, kind: CatalogKind) -> &str {
        self.endpoints.url_for(kind)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_rows(&self, kind: CatalogKind) -> Result<Vec<RawRow>, FetchError> {
        let url = self.endpoint(kind);
        log::debug!("GET {} ({} catalog)", url, kind);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            FetchError::Payload(format!(
                "Failed to decode {} response from {}: {}",
                kind, url, e
            ))
        })?;

        rows_from_value(body)
    }
}
