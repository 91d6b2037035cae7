//! Client for the permissions service that decides which apps are public.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{GatewayError, Result};

/// Resolves a public group to the catalog identifiers it may see.
#[async_trait]
pub trait PermissionsGateway: Send + Sync {
    /// Identifiers visible to `public_group`, in the order the service
    /// returned them.
    async fn public_app_ids(&self, public_group: &str) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct Permission {
    resource_name: String,
}

#[derive(Debug, Deserialize)]
struct PermissionsResponse {
    permissions: Vec<Permission>,
}

/// reqwest-backed [`PermissionsGateway`].
#[derive(Debug, Clone)]
pub struct PermissionsClient {
    base_url: Url,
    http: reqwest::Client,
}

impl PermissionsClient {
    /// Builds a client whose requests give up after `timeout`.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GatewayError::Request)?;
        Ok(Self::with_client(base_url, http))
    }

    /// Reuses an existing `reqwest::Client`.
    pub fn with_client(base_url: Url, http: reqwest::Client) -> Self {
        Self { base_url, http }
    }

    /// `{base}/permissions/abbreviated/subjects/group/{group}/app`
    pub fn public_ids_url(
        &self,
        public_group: &str,
    ) -> std::result::Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                GatewayError::InvalidUrl(self.base_url.to_string())
            })?;
            segments.pop_if_empty().extend([
                "permissions",
                "abbreviated",
                "subjects",
                "group",
                public_group,
                "app",
            ]);
        }
        Ok(url)
    }
}

#[async_trait]
impl PermissionsGateway for PermissionsClient {
    async fn public_app_ids(&self, public_group: &str) -> Result<Vec<String>> {
        let url = self.public_ids_url(public_group)?;
        debug!(%url, "resolving public app ids");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(GatewayError::Request)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GatewayError::Status(status).into());
        }

        let body = response.bytes().await.map_err(GatewayError::Request)?;
        let parsed: PermissionsResponse =
            serde_json::from_slice(&body).map_err(GatewayError::Decode)?;

        let ids: Vec<String> = parsed
            .permissions
            .into_iter()
            .map(|permission| permission.resource_name)
            .collect();
        debug!(count = ids.len(), "resolved public app ids");
        Ok(ids)
    }
}
