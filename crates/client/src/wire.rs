//! Wire formats for the identity service and the console backend.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use trackacademy_auth::{AccessToken, AuthUser, RefreshToken, RoleInfo, Session};
use trackacademy_core::UserId;

/// Token grant as issued by the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to when the grant was issued.
    pub expires_in: i64,
    pub user: WireUser,
}

impl TokenGrant {
    /// Anchor the relative expiry to `now` and produce the domain session.
    pub fn into_session(self, now: DateTime<Utc>) -> Session {
        Session {
            access_token: AccessToken::new(self.access_token),
            refresh_token: self.refresh_token.map(RefreshToken::new),
            user: self.user.into(),
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: Uuid,
    pub email: String,
}

impl From<WireUser> for AuthUser {
    fn from(value: WireUser) -> Self {
        Self {
            id: UserId::from_uuid(value.id),
            email: value.email,
        }
    }
}

/// Sign-up response. The token fields stay absent while the address awaits
/// confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpGrant {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user: WireUser,
}

impl SignUpGrant {
    /// `Some` when the provider granted a session right away.
    pub fn into_session(self, now: DateTime<Utc>) -> Option<Session> {
        let access_token = self.access_token?;
        Some(Session {
            access_token: AccessToken::new(access_token),
            refresh_token: self.refresh_token.map(RefreshToken::new),
            user: self.user.into(),
            expires_at: now + Duration::seconds(self.expires_in.unwrap_or(3600)),
        })
    }
}

/// Error payload of the identity service. Deployments are not consistent
/// about the field names, so every observed spelling is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Machine-readable error code, when one was sent.
    pub fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    /// Best human-readable message available.
    pub fn message(&self) -> &str {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("")
    }
}

/// Envelope of the backend's authenticated-user endpoint.
///
/// Deserializing `role_info` through [`RoleInfo`] is what rejects contract
/// drift: an unknown role label fails here, not somewhere downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleEnvelope {
    pub user: RoleUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleUser {
    pub role_info: RoleInfo,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
