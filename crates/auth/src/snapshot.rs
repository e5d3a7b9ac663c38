use crate::{AccessToken, AuthUser, RoleInfo, Session};

/// Immutable view of authentication state at one point in time.
///
/// # Invariants
/// - `user()` and `token()` are projections of `session`; there is no second
///   copy of identity data that could drift out of sync.
/// - `role.is_some()` implies `session.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    pub role: Option<RoleInfo>,
    pub loading: bool,
}

impl AuthSnapshot {
    /// State published before the restore check has answered.
    pub fn initial() -> Self {
        Self {
            session: None,
            role: None,
            loading: true,
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|session| &session.user)
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.session.as_ref().map(|session| &session.access_token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RefreshToken;
    use chrono::{TimeZone, Utc};
    use trackacademy_core::UserId;

    #[test]
    fn initial_snapshot_is_loading_with_nothing_resolved() {
        let snapshot = AuthSnapshot::initial();
        assert!(snapshot.loading);
        assert!(snapshot.session.is_none());
        assert!(snapshot.user().is_none());
        assert!(snapshot.token().is_none());
        assert!(!snapshot.is_authenticated());
    }

    #[test]
    fn user_and_token_derive_from_session() {
        let session = Session {
            access_token: AccessToken::new("tok-1"),
            refresh_token: Some(RefreshToken::new("ref-1")),
            user: AuthUser {
                id: UserId::new(),
                email: "admin@example.com".to_string(),
            },
            expires_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        };

        let snapshot = AuthSnapshot {
            session: Some(session.clone()),
            role: None,
            loading: false,
        };

        assert_eq!(snapshot.token(), Some(&session.access_token));
        assert_eq!(snapshot.user().map(|u| u.email.as_str()), Some("admin@example.com"));
        assert!(snapshot.is_authenticated());
    }
}
