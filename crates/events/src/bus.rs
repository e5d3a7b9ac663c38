//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **event bus pattern** - a pub/sub mechanism for
//! distributing notifications to multiple consumers (the session resolver,
//! loggers, anything watching auth state).
//!
//! ## Design Philosophy
//!
//! The bus is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Transport-agnostic**: the trait works for in-memory channels as well as
//!   a future remote transport
//! - **Per-subscriber ordering**: each subscriber sees one publisher's messages
//!   in publish order; interleaving between publishers is not defined
//! - **No persistence**: the bus distributes, it does not store; a subscriber
//!   that joins late starts from the next message
//!
//! Session-change notifications are full-state messages (each carries the
//! entire current session, not a delta), so a consumer that misses an
//! intermediate message still converges on the latest state.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Receiving consumes from this subscription
/// only; other subscribers are unaffected.
///
/// ## Usage Pattern
///
/// ```ignore
/// let bus: Arc<dyn EventBus<SessionChange, Error = ...>> = ...;
/// let mut subscription = bus.subscribe();
///
/// while let Some(change) = subscription.recv().await {
///     apply(change);
/// }
/// // `None` means every publisher is gone; tear down.
/// ```
///
/// ## Lifecycle
///
/// Dropping the subscription deregisters it: the bus prunes closed receivers
/// on the next publish. There is nothing to unsubscribe explicitly; scoped
/// ownership is the deregistration.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: UnboundedReceiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: UnboundedReceiver<M>) -> Self {
        Self { receiver }
    }

    /// Wait for the next message. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.receiver.recv().await
    }

    /// Take a message without waiting.
    pub fn try_recv(&mut self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Stop receiving; buffered messages can still be drained via `try_recv`.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// The bus sits between the identity provider (publisher) and the resolver
/// (subscriber). `publish` is synchronous and non-blocking: implementations
/// buffer per subscriber, so a slow consumer never stalls the publisher.
///
/// ## Error Handling
///
/// `publish` can fail (implementation-specific). For session notifications the
/// publisher treats a failed publish as a bug worth logging, not a reason to
/// abort the triggering operation; the sign-in itself already succeeded.
///
/// ## Thread Safety
///
/// `Send + Sync` is required; providers publish from whichever task completed
/// the network call.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
