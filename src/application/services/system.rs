//! Composition root - Wires directory, registry, queue and dispatcher

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::application::messaging::{envelope_queue, DispatcherHandle, MessageDispatcher, SessionRegistry};
use crate::domain::traits::UserDirectory;
use super::chat_service::ChatService;

/// A running chat core
pub struct ChatSystem {
    service: ChatService,
    dispatcher: DispatcherHandle,
    worker: JoinHandle<()>,
}

impl ChatSystem {
    /// Build the core around `directory` and start the dispatcher task.
    /// Must be called from within a tokio runtime.
    pub fn start(directory: Arc<dyn UserDirectory>, delivery_timeout: Duration) -> Self {
        let registry = Arc::new(SessionRegistry::new(delivery_timeout));
        let (queue, receiver) = envelope_queue();

        let dispatcher = MessageDispatcher::new(receiver, registry.clone());
        let handle = dispatcher.handle();
        let worker = dispatcher.spawn();

        Self {
            service: ChatService::new(directory, registry, queue),
            dispatcher: handle,
            worker,
        }
    }

    pub fn service(&self) -> &ChatService {
        &self.service
    }

    pub fn dispatcher(&self) -> &DispatcherHandle {
        &self.dispatcher
    }

    /// Stop the dispatcher. Envelopes still queued are dropped.
    pub fn shutdown(self) {
        self.worker.abort();
        tracing::info!("Chat system stopped");
    }
}
