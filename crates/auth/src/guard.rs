//! Route gating derived from authentication snapshots.

use trackacademy_core::AcademyId;

use crate::{AuthSnapshot, RoleInfo};

/// Destination the console should present for a given snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Resolution still in progress; keep the current screen.
    Hold,
    SignIn,
    PlatformDashboard,
    AcademyDashboard(AcademyId),
    AccessDenied,
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Route::Hold => f.write_str("hold"),
            Route::SignIn => f.write_str("sign_in"),
            Route::PlatformDashboard => f.write_str("platform_dashboard"),
            Route::AcademyDashboard(id) => write!(f, "academy_dashboard/{id}"),
            Route::AccessDenied => f.write_str("access_denied"),
        }
    }
}

/// Map a snapshot to its destination.
///
/// Pure on purpose. While `loading` is true the answer is always
/// [`Route::Hold`]: a redirect taken before resolution settles would bounce a
/// signed-in user to the sign-in screen and back.
pub fn route_for(snapshot: &AuthSnapshot) -> Route {
    if snapshot.loading {
        return Route::Hold;
    }
    if snapshot.session.is_none() {
        return Route::SignIn;
    }
    match &snapshot.role {
        Some(RoleInfo::SuperAdmin) => Route::PlatformDashboard,
        Some(RoleInfo::AcademyUser {
            academy_id: Some(id),
            ..
        }) if !id.is_empty() => Route::AcademyDashboard(id.clone()),
        // A blank id is as unusable as a missing one.
        Some(RoleInfo::AcademyUser { .. }) => Route::AccessDenied,
        // Player accounts and failed role fetches have no console surface.
        Some(RoleInfo::Player) | None => Route::SignIn,
    }
}

/// Deduplicates navigation so repeated snapshots do not re-trigger redirects.
///
/// # Invariants
/// - `observe` returns `Some` only when the destination differs from the one
///   already presented.
/// - [`Route::Hold`] never navigates and never forgets the current screen.
#[derive(Debug, Clone)]
pub struct RouteTracker {
    current: Option<Route>,
}

impl RouteTracker {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Destination currently presented, if any navigation has happened.
    pub fn current(&self) -> Option<&Route> {
        self.current.as_ref()
    }

    /// Fold one snapshot; returns the destination to navigate to, if any.
    pub fn observe(&mut self, snapshot: &AuthSnapshot) -> Option<Route> {
        let target = route_for(snapshot);
        if target == Route::Hold {
            return None;
        }
        if self.current.as_ref() == Some(&target) {
            return None;
        }
        self.current = Some(target.clone());
        Some(target)
    }
}

impl Default for RouteTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
