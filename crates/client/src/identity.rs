//! REST identity provider speaking the hosted auth service's token API.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use trackacademy_auth::{CredentialError, Session, SessionChange, SessionChangeKind};
use trackacademy_events::{EventBus, InMemoryEventBus, Subscription};
use trackacademy_session::{IdentityProvider, SignUpOutcome, SignUpRequest};

use crate::credentials::CredentialStore;
use crate::wire::{ErrorBody, SignUpGrant, TokenGrant};

/// Connection settings for the identity service.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the identity service, without a trailing slash.
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// How long before expiry the background scheduler rotates the token.
    pub refresh_margin: Duration,
}

impl IdentityConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            api_key: api_key.into(),
            refresh_margin: Duration::seconds(60),
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }
}

/// Identity provider backed by the hosted auth service's REST API.
///
/// Owns credential persistence and background token refresh. Session
/// transitions are published on an in-process bus; command return values are
/// immediate caller feedback only.
pub struct RestIdentityProvider {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    config: IdentityConfig,
    store: Arc<dyn CredentialStore>,
    current: Mutex<Option<Session>>,
    bus: InMemoryEventBus<SessionChange>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    /// Held across any whole session transition. `current` and `refresh_task`
    /// are only ever locked beneath it, and tasks are only aborted under it.
    transition: Mutex<()>,
}

impl RestIdentityProvider {
    pub fn new(config: IdentityConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                config,
                store,
                current: Mutex::new(None),
                bus: InMemoryEventBus::new(),
                refresh_task: Mutex::new(None),
                transition: Mutex::new(()),
            }),
        }
    }

    /// Session currently held in memory.
    pub async fn held_session(&self) -> Option<Session> {
        self.inner.current.lock().await.clone()
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn current_session(&self) -> Option<Session> {
        let stored = match self.inner.store.load().await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("no persisted credentials");
                return None;
            }
            Err(error) => {
                warn!(%error, "credential store unreadable; starting signed out");
                return None;
            }
        };

        let now = Utc::now();
        let session = if stored.expires_within(now, self.inner.config.refresh_margin) {
            // One refresh attempt; a stale credential that cannot be renewed
            // is treated as signed out, never surfaced as an error.
            match self.inner.refresh_session(&stored).await {
                Ok(session) => session,
                Err(error) => {
                    warn!(%error, "persisted session could not be refreshed; starting signed out");
                    if let Err(error) = self.inner.store.clear().await {
                        warn!(%error, "failed to clear stale credentials");
                    }
                    return None;
                }
            }
        } else {
            stored
        };

        self.inner.adopt(session.clone(), None).await;
        Some(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CredentialError> {
        let grant: TokenGrant = self
            .inner
            .post_auth(
                "/auth/v1/token?grant_type=password",
                &json!({ "email": email, "password": password }),
            )
            .await?;

        let session = grant.into_session(Utc::now());
        info!(user = %session.user.id, "sign-in granted");
        self.inner
            .adopt(session.clone(), Some(SessionChangeKind::SignedIn))
            .await;
        Ok(session)
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, CredentialError> {
        let grant: SignUpGrant = self
            .inner
            .post_auth(
                "/auth/v1/signup",
                &json!({
                    "email": request.email,
                    "password": request.password,
                    "data": request.metadata,
                }),
            )
            .await?;

        let email = grant.user.email.clone();
        match grant.into_session(Utc::now()) {
            Some(session) => {
                info!(user = %session.user.id, "sign-up granted an immediate session");
                self.inner
                    .adopt(session.clone(), Some(SessionChangeKind::SignedIn))
                    .await;
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => {
                info!(email = %email, "sign-up accepted; confirmation pending");
                Ok(SignUpOutcome::ConfirmationRequired { email })
            }
        }
    }

    async fn sign_out(&self) -> Result<(), CredentialError> {
        // Revocation is best-effort; local state clears regardless, so an
        // unreachable provider cannot trap the user in a session.
        let held = self.inner.current.lock().await.clone();
        if let Some(session) = held {
            let url = format!("{}/auth/v1/logout", self.inner.config.base_url);
            let result = self
                .inner
                .http
                .post(&url)
                .header("apikey", &self.inner.config.api_key)
                .bearer_auth(session.access_token.as_str())
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    warn!(
                        status = response.status().as_u16(),
                        "provider rejected sign-out; clearing locally"
                    );
                }
                Err(error) => {
                    warn!(%error, "provider unreachable during sign-out; clearing locally");
                }
                Ok(_) => {}
            }
        }
        self.inner.clear_session(true).await;
        Ok(())
    }

    fn subscribe(&self) -> Subscription<SessionChange> {
        self.inner.bus.subscribe()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request plumbing and session lifecycle
// ─────────────────────────────────────────────────────────────────────────────

impl Inner {
    async fn post_auth<T: DeserializeOwned>(
        &self,
        path_and_query: &str,
        body: &serde_json::Value,
    ) -> Result<T, CredentialError> {
        let url = format!("{}{path_and_query}", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|error| CredentialError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response).await);
        }
        response
            .json()
            .await
            .map_err(|error| CredentialError::Malformed(error.to_string()))
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, CredentialError> {
        let refresh_token = session
            .refresh_token
            .clone()
            .ok_or(CredentialError::NoRefreshToken)?;
        let grant: TokenGrant = self
            .post_auth(
                "/auth/v1/token?grant_type=refresh_token",
                &json!({ "refresh_token": refresh_token.as_str() }),
            )
            .await?;
        Ok(grant.into_session(Utc::now()))
    }

    /// Install a session: memory, store, refresh schedule, then notification.
    async fn adopt(self: &Arc<Self>, session: Session, notify: Option<SessionChangeKind>) {
        let _guard = self.transition.lock().await;
        *self.current.lock().await = Some(session.clone());
        if let Err(error) = self.store.save(&session).await {
            warn!(%error, "failed to persist session");
        }
        self.schedule_refresh(&session).await;
        if let Some(kind) = notify {
            let change = SessionChange {
                kind,
                session: Some(session),
            };
            if let Err(error) = self.bus.publish(change) {
                warn!(?error, "failed to publish session change");
            }
        }
    }

    /// Drop the session everywhere and announce the sign-out.
    ///
    /// `abort_refresh` is false when the caller is the refresh task itself;
    /// aborting the calling task would cut this cleanup short.
    async fn clear_session(self: &Arc<Self>, abort_refresh: bool) {
        let _guard = self.transition.lock().await;
        {
            let mut slot = self.refresh_task.lock().await;
            if let Some(task) = slot.take() {
                if abort_refresh {
                    task.abort();
                }
            }
        }
        *self.current.lock().await = None;
        if let Err(error) = self.store.clear().await {
            warn!(%error, "failed to clear persisted credentials");
        }
        if let Err(error) = self.bus.publish(SessionChange::signed_out()) {
            warn!(?error, "failed to publish sign-out");
        }
    }

    async fn schedule_refresh(self: &Arc<Self>, session: &Session) {
        let mut slot = self.refresh_task.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        if session.refresh_token.is_none() {
            debug!("session carries no refresh token; rotation not scheduled");
            return;
        }
        *slot = Some(tokio::spawn(refresh_loop(self.clone(), session.clone())));
    }
}

/// Floor for the rotation schedule. A session whose lifetime fits inside the
/// refresh margin would otherwise come due again the instant it is rotated.
const ROTATION_RETRY_PAUSE: std::time::Duration = std::time::Duration::from_secs(5);

/// Keep the held session fresh until it is replaced or renewal fails for good.
async fn refresh_loop(inner: Arc<Inner>, mut session: Session) {
    loop {
        let due = session.expires_at - inner.config.refresh_margin;
        let wait = (due - Utc::now())
            .to_std()
            .ok()
            .filter(|wait| !wait.is_zero())
            .unwrap_or(ROTATION_RETRY_PAUSE);
        tokio::time::sleep(wait).await;

        match inner.refresh_session(&session).await {
            Ok(next) => {
                debug!(user = %next.user.id, "access token rotated");
                let _guard = inner.transition.lock().await;
                *inner.current.lock().await = Some(next.clone());
                if let Err(error) = inner.store.save(&next).await {
                    warn!(%error, "failed to persist refreshed session");
                }
                if let Err(error) = inner.bus.publish(SessionChange::token_refreshed(next.clone()))
                {
                    warn!(?error, "failed to publish token refresh");
                }
                session = next;
            }
            Err(error) if error.is_transient() && !session.is_expired(Utc::now()) => {
                warn!(%error, "token rotation failed; retrying before expiry");
                tokio::time::sleep(ROTATION_RETRY_PAUSE).await;
            }
            Err(error) => {
                warn!(%error, "token rotation failed for good; signing out");
                inner.clear_session(false).await;
                return;
            }
        }
    }
}

/// Map a non-success auth response onto a credential error.
async fn rejection(status: reqwest::StatusCode, response: reqwest::Response) -> CredentialError {
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let credentials_rejected = status == reqwest::StatusCode::UNAUTHORIZED
        || (status == reqwest::StatusCode::BAD_REQUEST
            && matches!(body.code(), Some("invalid_grant" | "invalid_credentials")));
    if credentials_rejected {
        return CredentialError::InvalidCredentials;
    }
    CredentialError::Rejected {
        status: status.as_u16(),
        message: body.message().to_string(),
    }
}
