//! Session/role state machine.
//!
//! [`SessionMachine`] is a pure reducer: inputs go in, state changes and
//! effects come out. All IO (provider subscriptions, role fetches, timers)
//! lives in the resolver runtime that drives the machine. Keeping the core
//! pure makes the concurrency-sensitive paths (sign-out during a fetch, rapid
//! account switches) testable without a runtime.

use tracing::{debug, warn};

use crate::{AccessToken, AuthSnapshot, RoleFetchError, RoleInfo, Session, SessionChange};

// ─────────────────────────────────────────────────────────────────────────────
// Inputs and effects
// ─────────────────────────────────────────────────────────────────────────────

/// Input applied to the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Answer of the one-time restore check against persisted credentials.
    Restored(Option<Session>),

    /// Push notification from the identity provider.
    Changed(SessionChange),

    /// Completion of the role fetch issued under `generation`.
    RoleOutcome {
        generation: u64,
        result: Result<RoleInfo, RoleFetchError>,
    },
}

/// Side effect the runtime must carry out after an apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start a role fetch for the current session, tagged with `generation`.
    ResolveRole {
        generation: u64,
        token: AccessToken,
    },

    /// Stop the fetch issued under `generation`. The generation check already
    /// rejects a late outcome; aborting stops the wasted request.
    AbortResolve { generation: u64 },
}

// ─────────────────────────────────────────────────────────────────────────────
// Phase
// ─────────────────────────────────────────────────────────────────────────────

/// Coarse lifecycle phase, derived from machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Restore check not yet answered.
    Initializing,
    /// No session held.
    Unauthenticated,
    /// Session held, no role settled yet.
    ResolvingRole,
    /// Session held and role resolution settled. A background re-fetch after a
    /// token refresh keeps the phase here; the previous role stays visible.
    Authenticated,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::Unauthenticated => "unauthenticated",
            Phase::ResolvingRole => "resolving_role",
            Phase::Authenticated => "authenticated",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Machine
// ─────────────────────────────────────────────────────────────────────────────

/// Pure reducer for session and role state.
///
/// # Invariants
/// - `role.is_some()` implies `session.is_some()`.
/// - `loading` is true exactly while an answer is owed: before the restore
///   check resolves, or while a fetch for a not-yet-settled role is in flight.
/// - A role outcome mutates state only when its generation matches the fetch
///   currently in flight; every other outcome is discarded without effect.
/// - Clearing the session clears session, role, and loading in one apply, so
///   no observer can read a half-cleared state.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    session: Option<Session>,
    role: Option<RoleInfo>,
    loading: bool,
    restored: bool,
    generation: u64,
    in_flight: Option<u64>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            session: None,
            role: None,
            loading: true,
            restored: false,
            generation: 0,
            in_flight: None,
        }
    }

    /// Apply one input and return the effects the runtime must execute.
    pub fn apply(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Restored(session) => self.apply_restored(session),
            Input::Changed(change) => self.apply_changed(change),
            Input::RoleOutcome { generation, result } => self.apply_outcome(generation, result),
        }
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            session: self.session.clone(),
            role: self.role.clone(),
            loading: self.loading,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.session, &self.role) {
            (None, _) if !self.restored => Phase::Initializing,
            (None, _) => Phase::Unauthenticated,
            (Some(_), None) if self.in_flight.is_some() => Phase::ResolvingRole,
            (Some(_), _) => Phase::Authenticated,
        }
    }

    /// Generation of the fetch currently in flight, if any.
    pub fn resolving_generation(&self) -> Option<u64> {
        self.in_flight
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_restored(&mut self, session: Option<Session>) -> Vec<Effect> {
        // A push that arrived first already set `restored`; the late restore
        // answer must not clobber the fresher state.
        if self.restored {
            debug!("restore answer after state already settled; ignored");
            return Vec::new();
        }
        self.restored = true;

        match session {
            Some(session) => {
                debug!(user = %session.user.id, "session restored");
                self.session = Some(session);
                self.begin_fetch()
            }
            None => {
                debug!("no persisted session");
                self.loading = false;
                Vec::new()
            }
        }
    }

    fn apply_changed(&mut self, change: SessionChange) -> Vec<Effect> {
        // A provider push is at least as fresh as the restore check, so a
        // restore answer arriving later must not clobber what the push set.
        self.restored = true;

        match change.session {
            None => {
                debug!(kind = %change.kind, "session cleared");
                self.session = None;
                self.role = None;
                self.loading = false;
                self.abort_in_flight()
            }
            Some(session) => {
                let same_user = self
                    .session
                    .as_ref()
                    .is_some_and(|current| current.user.id == session.user.id);
                let keeps_role = same_user && self.role.is_some();

                debug!(
                    kind = %change.kind,
                    user = %session.user.id,
                    same_user,
                    "session changed; re-resolving role"
                );
                self.session = Some(session);
                if !keeps_role {
                    self.role = None;
                    self.loading = true;
                }

                let mut effects = self.abort_in_flight();
                effects.extend(self.begin_fetch());
                effects
            }
        }
    }

    fn apply_outcome(
        &mut self,
        generation: u64,
        result: Result<RoleInfo, RoleFetchError>,
    ) -> Vec<Effect> {
        if self.in_flight != Some(generation) {
            debug!(
                generation,
                in_flight = ?self.in_flight,
                "discarding role outcome from a superseded fetch"
            );
            return Vec::new();
        }
        self.in_flight = None;

        match result {
            Ok(role) => {
                debug!(role = %role, "role resolved");
                self.role = Some(role);
            }
            Err(error) => {
                warn!(%error, "role resolution failed; session kept without role");
                self.role = None;
            }
        }
        self.loading = false;
        Vec::new()
    }

    fn begin_fetch(&mut self) -> Vec<Effect> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        self.generation += 1;
        self.in_flight = Some(self.generation);
        vec![Effect::ResolveRole {
            generation: self.generation,
            token: session.access_token.clone(),
        }]
    }

    fn abort_in_flight(&mut self) -> Vec<Effect> {
        match self.in_flight.take() {
            Some(generation) => vec![Effect::AbortResolve { generation }],
            None => Vec::new(),
        }
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
