//! Role lookup against the console backend.

use async_trait::async_trait;
use tracing::debug;

use trackacademy_auth::{AccessToken, RoleFetchError, RoleInfo};
use trackacademy_session::RoleApi;

use crate::wire::RoleEnvelope;

/// Fetches the caller's role from `GET /api/auth/user`.
pub struct RestRoleApi {
    http: reqwest::Client,
    base_url: String,
}

impl RestRoleApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Share an existing client; connection pools are per-client.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }
}

#[async_trait]
impl RoleApi for RestRoleApi {
    async fn resolve_role(&self, token: &AccessToken) -> Result<RoleInfo, RoleFetchError> {
        let url = format!("{}/api/auth/user", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|error| RoleFetchError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RoleFetchError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: RoleEnvelope = response
            .json()
            .await
            .map_err(|error| RoleFetchError::Contract(error.to_string()))?;
        debug!(role = %envelope.user.role_info.label(), "role resolved");
        Ok(envelope.user.role_info)
    }
}
