//! Typed identifiers and the base error model shared by every console crate.
//!
//! Pure domain vocabulary with no infrastructure concerns. The hosted backend
//! owns all business rules; what lives here is only the language the console
//! needs to talk about principals and academies.

pub mod error;
pub mod id;

pub use error::DomainError;
pub use id::{AcademyId, UserId};
