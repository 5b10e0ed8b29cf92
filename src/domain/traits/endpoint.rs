use async_trait::async_trait;
use crate::domain::entities::MessageEnvelope;
use crate::application::errors::DeliveryError;

/// SessionEndpoint trait - the live message sink of one logged-in user
///
/// The dispatcher never calls this directly: each registered session gets
/// its own forwarding task that awaits `deliver` one envelope at a time, so
/// a slow endpoint only delays itself.
#[async_trait]
pub trait SessionEndpoint: Send + Sync {
    /// Display or hand off a routed envelope
    async fn deliver(&self, envelope: &MessageEnvelope) -> Result<(), DeliveryError>;
}
