//! Channel adapter - Forwards delivered envelopes into a tokio channel

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::errors::DeliveryError;
use crate::domain::entities::MessageEnvelope;
use crate::domain::traits::SessionEndpoint;

/// Endpoint for embedders that consume envelopes from their own task
pub struct ChannelEndpoint {
    sender: mpsc::UnboundedSender<MessageEnvelope>,
}

impl ChannelEndpoint {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MessageEnvelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl SessionEndpoint for ChannelEndpoint {
    async fn deliver(&self, envelope: &MessageEnvelope) -> Result<(), DeliveryError> {
        self.sender
            .send(envelope.clone())
            .map_err(|_| DeliveryError::Closed("receiver dropped".to_string()))
    }
}
