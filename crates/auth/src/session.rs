//! Session primitives shared across the workspace.
//!
//! Everything in this module is plain data. Establishing, refreshing, and
//! revoking sessions is the job of an identity provider implementation;
//! role lookup is the job of the backend role endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use trackacademy_core::UserId;

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Bearer token issued by the identity provider.
///
/// The raw value never appears in `Debug` output; snapshots and state
/// transitions are logged and must not leak credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "AccessToken(len={})", self.0.len())
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Opaque refresh grant paired with an access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "RefreshToken(len={})", self.0.len())
    }
}

impl From<String> for RefreshToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RefreshToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// Identity subject as reported by the provider.
///
/// This is authentication-only data. Authorization (the role) is resolved
/// separately against the backend and lives in [`crate::RoleInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// An authenticated provider session.
///
/// # Invariants
/// - `access_token` is the only token ever sent to the backend; callers must
///   not cache it separately from the session that owns it.
/// - Expiry checks take `now` explicitly so they stay deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
    pub user: AuthUser,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// True when the session expires within `margin` of `now`. The refresh
    /// scheduler uses this to renew ahead of the deadline.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + margin >= self.expires_at
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Change notifications
// ─────────────────────────────────────────────────────────────────────────────

/// Why the identity provider pushed a new session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionChangeKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

impl SessionChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionChangeKind::SignedIn => "signed_in",
            SessionChangeKind::SignedOut => "signed_out",
            SessionChangeKind::TokenRefreshed => "token_refreshed",
        }
    }
}

impl core::fmt::Display for SessionChangeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push notification from the identity provider.
///
/// `session` carries the full state after the change, not a delta. A consumer
/// that misses intermediate notifications still converges on the latest state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub kind: SessionChangeKind,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: SessionChangeKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: SessionChangeKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: SessionChangeKind::TokenRefreshed,
            session: Some(session),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session_expiring_at(expires_at: DateTime<Utc>) -> Session {
        Session {
            access_token: AccessToken::new("tok-abc"),
            refresh_token: Some(RefreshToken::new("ref-xyz")),
            user: AuthUser {
                id: UserId::new(),
                email: "coach@example.com".to_string(),
            },
            expires_at,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let session = session_expiring_at(deadline);

        assert!(!session.is_expired(deadline - Duration::seconds(1)));
        assert!(session.is_expired(deadline));
        assert!(session.is_expired(deadline + Duration::seconds(1)));
    }

    #[test]
    fn expires_within_honors_margin() {
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let session = session_expiring_at(deadline);
        let margin = Duration::minutes(5);

        assert!(!session.expires_within(deadline - Duration::minutes(10), margin));
        assert!(session.expires_within(deadline - Duration::minutes(5), margin));
        assert!(session.expires_within(deadline - Duration::minutes(1), margin));
    }

    #[test]
    fn debug_output_never_contains_raw_tokens() {
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let session = session_expiring_at(deadline);

        let rendered = format!("{session:?}");
        assert!(!rendered.contains("tok-abc"));
        assert!(!rendered.contains("ref-xyz"));
        assert!(rendered.contains("AccessToken(len=7)"));
    }

    #[test]
    fn access_token_serde_is_transparent() {
        let token = AccessToken::new("tok-abc");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"tok-abc\"");

        let back: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn signed_out_change_carries_no_session() {
        let change = SessionChange::signed_out();
        assert_eq!(change.kind, SessionChangeKind::SignedOut);
        assert!(change.session.is_none());
    }
}
