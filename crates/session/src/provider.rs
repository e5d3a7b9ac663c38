//! Identity provider port.

use async_trait::async_trait;
use serde::Serialize;

use trackacademy_auth::{CredentialError, Session, SessionChange};
use trackacademy_events::Subscription;

/// Sign-up submission forwarded to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    /// Extra profile fields forwarded verbatim (display name, phone, the
    /// academy the applicant belongs to).
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl SignUpRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// What the provider granted for a sign-up.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// Session established immediately; a change notification follows.
    SignedIn(Session),
    /// Account created but the provider withholds the session until the
    /// address is confirmed. No change notification fires.
    ConfirmationRequired { email: String },
}

/// Port to the hosted identity service.
///
/// Implementations own credential storage and token refresh. Consumers learn
/// about session transitions through [`IdentityProvider::subscribe`]; the
/// return values of the command methods are for the caller's immediate
/// feedback only and never feed state directly.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Session restored from persisted credentials, if one is usable.
    ///
    /// Called once at startup. Implementations may take their time (disk
    /// read, refresh round-trip); the resolver stays in its loading state
    /// until this answers.
    async fn current_session(&self) -> Option<Session>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CredentialError>;

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, CredentialError>;

    /// Revoke the session. Succeeds locally even when the provider cannot be
    /// reached; the signed-out notification always fires.
    async fn sign_out(&self) -> Result<(), CredentialError>;

    /// Stream of session transitions. Every message carries the full state
    /// after the change.
    fn subscribe(&self) -> Subscription<SessionChange>;
}
