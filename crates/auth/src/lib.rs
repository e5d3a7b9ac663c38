//! Session and role domain: the pure state machine, snapshots, and routing.
//!
//! This crate is intentionally decoupled from HTTP, storage, and the async
//! runtime. The state machine in [`machine`] consumes inputs and emits
//! effects; executing those effects is the resolver runtime's job.

pub mod error;
pub mod guard;
pub mod machine;
pub mod role;
pub mod session;
pub mod snapshot;

pub use error::{CredentialError, RoleFetchError};
pub use guard::{Route, RouteTracker, route_for};
pub use machine::{Effect, Input, Phase, SessionMachine};
pub use role::RoleInfo;
pub use session::{
    AccessToken, AuthUser, RefreshToken, Session, SessionChange, SessionChangeKind,
};
pub use snapshot::AuthSnapshot;
