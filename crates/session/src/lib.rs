//! Resolver runtime binding the pure session machine to a live identity
//! provider and role endpoint.
//!
//! The runtime owns a single event loop per process. Everything observable
//! leaves through a `tokio::sync::watch` snapshot stream; commands enter
//! through [`ResolverHandle`].

pub mod provider;
pub mod resolver;
pub mod role_api;

pub use provider::{IdentityProvider, SignUpOutcome, SignUpRequest};
pub use resolver::{ResolverHandle, SessionResolver};
pub use role_api::RoleApi;
