//! Components directory lookup.
//!
//! A plain unauthenticated GET against the public component registry; the
//! entries are returned as raw JSON because the bot only forwards them.

use std::time::Duration;

use async_trait::async_trait;
use model::{ApiError, ComponentCatalog};
use tracing::{debug, instrument};
use url::Url;

use crate::client::{send, transport_error};
use crate::ClientError;

/// Default location of the components directory.
pub const DEFAULT_COMPONENTS_URL: &str = "http://component.io/components/all";

/// Client for the components directory.
#[derive(Debug, Clone)]
pub struct ComponentDirectory {
    http: reqwest::Client,
    url: Url,
}

impl ComponentDirectory {
    /// Creates a client reading from `url`.
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self, ClientError> {
        let url = Url::parse(url).map_err(|source| ClientError::InvalidBaseUrl {
            url: url.to_string(),
            source,
        })?;
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl ComponentCatalog for ComponentDirectory {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn list_components(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        debug!("fetch components");
        let response = send(self.http.get(self.url.clone())).await?;
        response.json().await.map_err(transport_error)
    }
}
