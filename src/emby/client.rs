use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::models::ItemsResponse;
use crate::{Error, Result, proxy::client::upstream_url};

const METADATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only client for the backend's item metadata endpoint.
#[derive(Clone)]
pub struct EmbyClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for EmbyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbyClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl EmbyClient {
    pub fn new(client: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Look up one item by identifier, returning its path and media sources.
    pub async fn query_item(&self, id: &str) -> Result<ItemsResponse> {
        let mut url = upstream_url(&self.base_url, "/Items", None);
        url.query_pairs_mut()
            .append_pair("Ids", id)
            .append_pair("Limit", "1")
            .append_pair("Fields", "Path,MediaSources")
            .append_pair("Recursive", "true")
            .append_pair("api_key", &self.api_key);

        tracing::debug!("Querying item {} from backend", id);

        let response = self
            .client
            .get(url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamStatus {
                url: upstream_url(&self.base_url, "/Items", None).to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
