//! Session registry - Which users have a live, addressable session

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::errors::DeliveryError;
use crate::domain::entities::MessageEnvelope;
use crate::domain::traits::SessionEndpoint;

/// Push handle for one registered session.
///
/// Owns the sending half of the session's delivery channel; a dedicated
/// task on the other half awaits the endpoint, so pushing never blocks.
/// Once closed, the task makes no further `deliver` calls.
#[derive(Clone)]
pub struct SessionHandle {
    username: Arc<str>,
    sender: mpsc::UnboundedSender<MessageEnvelope>,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Spawn the delivery task for `endpoint` and return its handle.
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        username: &str,
        endpoint: Arc<dyn SessionEndpoint>,
        delivery_timeout: Duration,
    ) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<MessageEnvelope>();
        let owner = username.to_string();
        let closed = Arc::new(AtomicBool::new(false));
        let stop = closed.clone();

        tokio::spawn(async move {
            while let Some(envelope) = receiver.recv().await {
                if stop.load(Ordering::SeqCst) {
                    tracing::debug!("[{}] session closed, discarding backlog", owner);
                    break;
                }

                let result = tokio::time::timeout(delivery_timeout, endpoint.deliver(&envelope))
                    .await
                    .unwrap_or(Err(DeliveryError::Timeout(delivery_timeout)));

                match result {
                    Ok(()) => tracing::debug!("[{}] delivered {}", owner, envelope.id()),
                    Err(e) => tracing::warn!("[{}] delivery of {} failed: {}", owner, envelope.id(), e),
                }
            }
            tracing::debug!("[{}] session delivery task finished", owner);
        });

        Self {
            username: Arc::from(username),
            sender,
            closed,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Hand an envelope to the session's delivery task
    pub fn push(&self, envelope: MessageEnvelope) -> Result<(), DeliveryError> {
        if self.is_closed() {
            return Err(DeliveryError::Closed(self.username.to_string()));
        }
        self.sender
            .send(envelope)
            .map_err(|_| DeliveryError::Closed(self.username.to_string()))
    }

    /// Stop delivering. A `deliver` already in progress may finish.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.sender.is_closed()
    }
}

/// Registry of open sessions keyed by username
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    delivery_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            delivery_timeout,
        }
    }

    /// Register a session for `username`.
    ///
    /// Returns `false` and keeps the existing handle if the user already
    /// has one.
    pub fn register(&self, username: &str, endpoint: Arc<dyn SessionEndpoint>) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        if sessions.contains_key(username) {
            tracing::debug!("Session for {} already open", username);
            return false;
        }

        let handle = SessionHandle::spawn(username, endpoint, self.delivery_timeout);
        sessions.insert(username.to_string(), handle);
        tracing::info!("Session opened: {}", username);
        true
    }

    /// Remove the session of `username`. Returns whether one was present.
    pub fn unregister(&self, username: &str) -> bool {
        let removed = self.sessions.write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(username);

        match removed {
            Some(handle) => {
                handle.close();
                tracing::info!("Session closed: {}", username);
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, username: &str) -> Option<SessionHandle> {
        self.sessions.read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .cloned()
    }

    /// Snapshot of every open session for broadcast fan-out
    pub fn all_endpoints(&self) -> Vec<SessionHandle> {
        self.sessions.read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn is_registered(&self, username: &str) -> bool {
        self.sessions.read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(username)
    }

    /// Usernames with an open session, sorted
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sessions.read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::channel::ChannelEndpoint;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct SlowEndpoint {
        delivered: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SessionEndpoint for SlowEndpoint {
        async fn deliver(&self, _envelope: &MessageEnvelope) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.delivered.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_second_register_keeps_first_endpoint() {
        let registry = SessionRegistry::default();
        let (first, mut first_rx) = ChannelEndpoint::new();
        let (second, mut second_rx) = ChannelEndpoint::new();

        assert!(registry.register("alice", Arc::new(first)));
        assert!(!registry.register("alice", Arc::new(second)));
        assert_eq!(registry.len(), 1);

        let handle = registry.lookup("alice").unwrap();
        handle.push(MessageEnvelope::broadcast("bob", "hi")).unwrap();

        let got = first_rx.recv().await.unwrap();
        assert_eq!(got.body(), "hi");
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_absent_is_noop() {
        let registry = SessionRegistry::default();
        assert!(!registry.unregister("nobody"));

        let (endpoint, _rx) = ChannelEndpoint::new();
        registry.register("alice", Arc::new(endpoint));
        assert!(registry.unregister("alice"));
        assert!(!registry.unregister("alice"));
        assert!(registry.lookup("alice").is_none());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_and_usernames() {
        let registry = SessionRegistry::default();
        for name in ["carol", "alice", "bob"] {
            let (endpoint, _rx) = ChannelEndpoint::new();
            registry.register(name, Arc::new(endpoint));
        }

        assert_eq!(registry.all_endpoints().len(), 3);
        assert_eq!(registry.usernames(), vec!["alice", "bob", "carol"]);
        assert!(registry.is_registered("bob"));
    }

    #[tokio::test]
    async fn test_concurrent_register_unregister() {
        let registry = Arc::new(SessionRegistry::default());
        let mut tasks = Vec::new();

        for i in 0..16 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let name = format!("user{}", i % 4);
                let (endpoint, _rx) = ChannelEndpoint::new();
                registry.register(&name, Arc::new(endpoint));
                let _ = registry.all_endpoints();
                if i % 2 == 0 {
                    registry.unregister(&name);
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(registry.len() <= 4);
    }

    #[tokio::test]
    async fn test_no_delivery_after_unregister() {
        let registry = SessionRegistry::default();
        let delivered = Arc::new(AtomicUsize::new(0));
        registry.register("b", Arc::new(SlowEndpoint { delivered: delivered.clone() }));

        let handle = registry.lookup("b").unwrap();
        for i in 0..5 {
            handle.push(MessageEnvelope::broadcast("a", format!("m{}", i))).unwrap();
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(registry.unregister("b"));
        assert!(handle.is_closed());
        assert!(handle.push(MessageEnvelope::broadcast("a", "late")).is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        // Only the delivery already running at unregister may complete
        assert!(delivered.load(Ordering::SeqCst) <= 1);
    }
}
