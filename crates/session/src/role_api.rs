//! Role lookup port.

use async_trait::async_trait;

use trackacademy_auth::{AccessToken, RoleFetchError, RoleInfo};

/// Port to the backend endpoint that maps a bearer token to a role.
///
/// The resolver calls this once per session transition. Implementations must
/// be cancellation-safe: the resolver aborts a fetch the moment a newer
/// session supersedes it.
#[async_trait]
pub trait RoleApi: Send + Sync {
    async fn resolve_role(&self, token: &AccessToken) -> Result<RoleInfo, RoleFetchError>;
}
