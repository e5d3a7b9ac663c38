//! REST adapters for the hosted identity service and the console backend,
//! plus credential persistence between runs.

pub mod credentials;
pub mod identity;
pub mod roles;
pub mod wire;

pub use credentials::{CredentialStore, FileCredentialStore, InMemoryCredentialStore, StoreError};
pub use identity::{IdentityConfig, RestIdentityProvider};
pub use roles::RestRoleApi;
