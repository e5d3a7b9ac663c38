//! Event publishing/subscription mechanics for session-change notifications.
//!
//! The identity provider publishes session changes; the resolver (and anything
//! else that cares) subscribes. This crate holds only the transport-agnostic
//! mechanics; the event *types* belong to the domain crates.

pub mod bus;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
