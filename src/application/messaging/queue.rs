//! Envelope queue - Many producers, one dispatcher

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::errors::SubmitError;
use crate::domain::entities::MessageEnvelope;

/// Create a connected producer/consumer pair
pub fn envelope_queue() -> (EnvelopeQueue, EnvelopeReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        EnvelopeQueue {
            sender,
            pending: pending.clone(),
        },
        EnvelopeReceiver { receiver, pending },
    )
}

/// Producer side of the queue. Cloned into every session.
#[derive(Clone)]
pub struct EnvelopeQueue {
    sender: mpsc::UnboundedSender<MessageEnvelope>,
    pending: Arc<AtomicUsize>,
}

impl EnvelopeQueue {
    /// Enqueue an envelope without blocking.
    ///
    /// Envelopes that fail shape validation never enter the queue. If the
    /// dispatcher is gone the envelope is dropped, as during shutdown.
    pub fn submit(&self, envelope: MessageEnvelope) -> Result<(), SubmitError> {
        envelope.validate()?;

        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.sender.send(envelope) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            tracing::debug!("Dispatcher stopped, dropping envelope {}", err.0.id());
        }
        Ok(())
    }

    /// Envelopes submitted but not yet taken by the dispatcher
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer side of the queue, owned by the dispatcher
pub struct EnvelopeReceiver {
    receiver: mpsc::UnboundedReceiver<MessageEnvelope>,
    pending: Arc<AtomicUsize>,
}

impl EnvelopeReceiver {
    /// Wait for the next envelope in enqueue order.
    ///
    /// Returns `None` once every producer handle has been dropped and the
    /// queue is drained.
    pub async fn next(&mut self) -> Option<MessageEnvelope> {
        let envelope = self.receiver.recv().await?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageKind;

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, mut rx) = envelope_queue();
        for i in 0..5 {
            queue.submit(MessageEnvelope::broadcast("alice", format!("m{}", i))).unwrap();
        }
        assert_eq!(queue.len(), 5);

        for i in 0..5 {
            let env = rx.next().await.unwrap();
            assert_eq!(env.body(), format!("m{}", i));
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_envelopes_not_queued() {
        let (queue, _rx) = envelope_queue();

        let err = queue.submit(MessageEnvelope::broadcast("alice", "")).unwrap_err();
        assert_eq!(err, SubmitError::EmptyBody);

        let malformed = MessageEnvelope::new("bob", MessageKind::Private, None, "x");
        let err = queue.submit(malformed).unwrap_err();
        assert_eq!(err, SubmitError::MalformedPrivate);

        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_receiver_ends_when_producers_dropped() {
        let (queue, mut rx) = envelope_queue();
        queue.submit(MessageEnvelope::broadcast("alice", "last")).unwrap();
        drop(queue);

        assert_eq!(rx.next().await.map(|e| e.body().to_string()), Some("last".to_string()));
        assert!(rx.next().await.is_none());
    }

    #[tokio::test]
    async fn test_submit_after_dispatcher_gone() {
        let (queue, rx) = envelope_queue();
        drop(rx);

        assert!(queue.is_closed());
        assert!(queue.submit(MessageEnvelope::broadcast("alice", "hi")).is_ok());
        assert_eq!(queue.len(), 0);
    }
}
