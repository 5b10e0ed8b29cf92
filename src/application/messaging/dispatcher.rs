//! Message dispatcher - Routes queued envelopes to live sessions

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::entities::{MessageEnvelope, MessageKind};
use super::queue::EnvelopeReceiver;
use super::registry::{SessionHandle, SessionRegistry};

/// What the dispatcher is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Waiting on the queue
    Idle,
    /// Fanning out one envelope
    Routing,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => DispatcherState::Routing,
            _ => DispatcherState::Idle,
        }
    }
}

/// Why an envelope reached nobody
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Recipient has no open session at dispatch time
    UnknownRecipient(String),
    /// Envelope shape was invalid
    Malformed(String),
}

/// Result of routing one envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Broadcast { delivered: usize },
    Private { recipient: String, sender_echoed: bool },
    Dropped(DropReason),
}

/// Counter snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Envelopes taken off the queue
    pub routed: u64,
    /// Successful pushes into session delivery channels
    pub delivered: u64,
    /// Private envelopes whose recipient was offline
    pub dropped: u64,
    /// Envelopes discarded as malformed
    pub malformed: u64,
}

const STATE_CHANNEL_CAPACITY: usize = 64;

struct Shared {
    state: AtomicU8,
    transitions: broadcast::Sender<DispatcherState>,
    routed: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    malformed: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        let (transitions, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Self {
            state: AtomicU8::new(DispatcherState::Idle as u8),
            transitions,
            routed: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
        }
    }
}

/// Read-only view of a running dispatcher
#[derive(Clone)]
pub struct DispatcherHandle {
    shared: Arc<Shared>,
}

impl DispatcherHandle {
    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Every state change from now on, in order. A lagging receiver
    /// loses the oldest ones.
    pub fn subscribe(&self) -> broadcast::Receiver<DispatcherState> {
        self.shared.transitions.subscribe()
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            routed: self.shared.routed.load(Ordering::SeqCst),
            delivered: self.shared.delivered.load(Ordering::SeqCst),
            dropped: self.shared.dropped.load(Ordering::SeqCst),
            malformed: self.shared.malformed.load(Ordering::SeqCst),
        }
    }
}

/// Single routing authority: drains the queue and fans envelopes out
pub struct MessageDispatcher {
    receiver: EnvelopeReceiver,
    registry: Arc<SessionRegistry>,
    shared: Arc<Shared>,
}

impl MessageDispatcher {
    pub fn new(receiver: EnvelopeReceiver, registry: Arc<SessionRegistry>) -> Self {
        Self {
            receiver,
            registry,
            shared: Arc::new(Shared::new()),
        }
    }

    pub fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            shared: self.shared.clone(),
        }
    }

    /// Run the dispatch loop on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Dispatch loop. Ends only when every producer is gone.
    pub async fn run(mut self) {
        tracing::info!("Message dispatcher started");

        while let Some(envelope) = self.receiver.next().await {
            self.set_state(DispatcherState::Routing);
            let waited = chrono::Utc::now() - envelope.timestamp();
            tracing::debug!(
                "Routing {} envelope {} from {} (queued {}ms)",
                envelope.kind().as_str(), envelope.id(), envelope.sender(), waited.num_milliseconds()
            );
            let outcome = self.route(envelope);
            tracing::debug!("Routed: {:?}", outcome);
            self.set_state(DispatcherState::Idle);
        }

        tracing::info!("Envelope queue closed, dispatcher stopping");
    }

    /// Route a single envelope against the current registry
    pub fn route(&self, envelope: MessageEnvelope) -> RouteOutcome {
        self.shared.routed.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = envelope.validate() {
            tracing::warn!("Discarding malformed envelope {}: {}", envelope.id(), e);
            self.shared.malformed.fetch_add(1, Ordering::SeqCst);
            return RouteOutcome::Dropped(DropReason::Malformed(e.to_string()));
        }

        match envelope.kind() {
            MessageKind::Broadcast => {
                let sessions = self.registry.all_endpoints();
                let delivered = sessions
                    .iter()
                    .filter(|session| self.push(session, envelope.clone()))
                    .count();
                RouteOutcome::Broadcast { delivered }
            }
            MessageKind::Private => {
                // validate() guarantees a recipient on private envelopes
                let recipient = envelope.recipient().unwrap_or_default().to_string();

                let Some(target) = self.registry.lookup(&recipient) else {
                    tracing::debug!(
                        "Recipient {} not online, dropping {} from {}",
                        recipient, envelope.id(), envelope.sender()
                    );
                    self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                    return RouteOutcome::Dropped(DropReason::UnknownRecipient(recipient));
                };

                // Sender sees its own copy, also when writing to itself
                let echo = self.registry.lookup(envelope.sender());

                self.push(&target, envelope.clone());
                let sender_echoed = match echo {
                    Some(own) => self.push(&own, envelope),
                    None => false,
                };

                RouteOutcome::Private { recipient, sender_echoed }
            }
        }
    }

    fn push(&self, session: &SessionHandle, envelope: MessageEnvelope) -> bool {
        match session.push(envelope) {
            Ok(()) => {
                self.shared.delivered.fetch_add(1, Ordering::SeqCst);
                true
            }
            Err(e) => {
                tracing::warn!("Push to {} failed: {}", session.username(), e);
                false
            }
        }
    }

    fn set_state(&self, state: DispatcherState) {
        self.shared.state.store(state as u8, Ordering::SeqCst);
        // No subscribers is fine
        let _ = self.shared.transitions.send(state);
    }
}
