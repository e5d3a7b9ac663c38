//! Resolver runtime: drives the session machine against live IO.
//!
//! The machine decides, the loop executes. Role fetches run as spawned tasks
//! tagged with the machine's generation counter; the loop aborts superseded
//! tasks and the machine discards any answer that outruns the abort.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use trackacademy_auth::{
    AuthSnapshot, CredentialError, Effect, Input, Phase, RoleFetchError, RoleInfo, Session,
    SessionMachine,
};

use crate::provider::{IdentityProvider, SignUpOutcome, SignUpRequest};
use crate::role_api::RoleApi;

type FetchOutcome = (u64, Result<RoleInfo, RoleFetchError>);

/// Wiring for the resolver task. Call [`SessionResolver::spawn`] from within
/// a runtime.
pub struct SessionResolver<P, R> {
    provider: Arc<P>,
    role_api: Arc<R>,
}

impl<P, R> SessionResolver<P, R>
where
    P: IdentityProvider + 'static,
    R: RoleApi + 'static,
{
    pub fn new(provider: Arc<P>, role_api: Arc<R>) -> Self {
        Self { provider, role_api }
    }

    /// Spawn the resolver loop and hand back its control surface.
    pub fn spawn(self) -> ResolverHandle<P> {
        let (snapshot_tx, snapshot_rx) = watch::channel(AuthSnapshot::initial());
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(run(
            self.provider.clone(),
            self.role_api,
            snapshot_tx,
            shutdown.clone(),
        ));

        ResolverHandle {
            provider: self.provider,
            snapshot_rx,
            shutdown,
            task,
        }
    }
}

/// Control surface over a running resolver.
///
/// Command methods delegate to the identity provider; their return values are
/// immediate caller feedback only. Observable state always flows through the
/// snapshot stream, so every consumer sees the same ordering.
pub struct ResolverHandle<P> {
    provider: Arc<P>,
    snapshot_rx: watch::Receiver<AuthSnapshot>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl<P: IdentityProvider> ResolverHandle<P> {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// New receiver over the snapshot stream. A slow reader sees coalesced
    /// updates, never stale ones.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot_rx.clone()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, CredentialError> {
        self.provider.sign_in(email, password).await
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignUpOutcome, CredentialError> {
        self.provider.sign_up(request).await
    }

    pub async fn sign_out(&self) -> Result<(), CredentialError> {
        self.provider.sign_out().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request graceful shutdown and wait for the loop to stop.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Err(error) = (&mut self.task).await {
            warn!(%error, "session resolver task did not stop cleanly");
        }
    }
}

impl<P> Drop for ResolverHandle<P> {
    fn drop(&mut self) {
        // A handle dropped without an explicit shutdown still stops the loop;
        // the notify permit is consumed on the task's next select pass.
        self.shutdown.notify_one();
    }
}

async fn run<P, R>(
    provider: Arc<P>,
    role_api: Arc<R>,
    snapshot_tx: watch::Sender<AuthSnapshot>,
    shutdown: Arc<Notify>,
) where
    P: IdentityProvider + 'static,
    R: RoleApi + 'static,
{
    info!("session resolver started");

    // Subscribe before the restore check: a sign-in racing the check queues
    // its notification here instead of getting lost.
    let mut changes = provider.subscribe();

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let mut state = LoopState::new(role_api, snapshot_tx, outcome_tx);

    let restored = provider.current_session().await;
    state.step(Input::Restored(restored));

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("session resolver received shutdown signal");
                break;
            }
            change = changes.recv() => {
                match change {
                    Some(change) => state.step(Input::Changed(change)),
                    None => {
                        warn!("identity provider change stream closed; stopping resolver");
                        break;
                    }
                }
            }
            outcome = outcome_rx.recv() => {
                // Never `None`: the loop state keeps a sender alive.
                if let Some((generation, result)) = outcome {
                    state.finish_fetch(generation);
                    state.step(Input::RoleOutcome { generation, result });
                }
            }
        }
    }

    state.abort_all();
    info!("session resolver stopped");
}

/// Mutable state owned by the resolver loop.
struct LoopState<R> {
    machine: SessionMachine,
    role_api: Arc<R>,
    snapshot_tx: watch::Sender<AuthSnapshot>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetches: HashMap<u64, JoinHandle<()>>,
    phase: Phase,
}

impl<R: RoleApi + 'static> LoopState<R> {
    fn new(
        role_api: Arc<R>,
        snapshot_tx: watch::Sender<AuthSnapshot>,
        outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    ) -> Self {
        Self {
            machine: SessionMachine::new(),
            role_api,
            snapshot_tx,
            outcome_tx,
            fetches: HashMap::new(),
            phase: Phase::Initializing,
        }
    }

    /// Apply one input, execute its effects, publish the new snapshot.
    fn step(&mut self, input: Input) {
        let effects = self.machine.apply(input);
        for effect in effects {
            match effect {
                Effect::ResolveRole { generation, token } => {
                    let role_api = self.role_api.clone();
                    let outcome_tx = self.outcome_tx.clone();
                    let handle = tokio::spawn(async move {
                        let result = role_api.resolve_role(&token).await;
                        // Loop gone means nothing cares about the answer.
                        let _ = outcome_tx.send((generation, result));
                    });
                    self.fetches.insert(generation, handle);
                }
                Effect::AbortResolve { generation } => {
                    if let Some(handle) = self.fetches.remove(&generation) {
                        handle.abort();
                        debug!(generation, "aborted superseded role fetch");
                    }
                }
            }
        }
        self.publish();
    }

    fn finish_fetch(&mut self, generation: u64) {
        self.fetches.remove(&generation);
    }

    fn publish(&mut self) {
        let phase = self.machine.phase();
        if phase != self.phase {
            info!(from = %self.phase, to = %phase, "session phase changed");
            self.phase = phase;
        }
        // Send fails only when every receiver is gone; the handle keeps one.
        let _ = self.snapshot_tx.send(self.machine.snapshot());
    }

    fn abort_all(&mut self) {
        for (generation, handle) in self.fetches.drain() {
            handle.abort();
            debug!(generation, "aborted role fetch at shutdown");
        }
    }
}
