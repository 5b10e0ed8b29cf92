use chrono::{DateTime, Utc};
use std::fmt;

use crate::application::errors::SubmitError;

/// How an envelope is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Broadcast,
    Private,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Broadcast => "broadcast",
            MessageKind::Private => "private",
        }
    }
}

/// Immutable unit of routable chat content.
///
/// Fields are only readable after construction; an envelope is consumed
/// exactly once by the dispatcher and never changed on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    id: String,
    sender: String,
    kind: MessageKind,
    recipient: Option<String>,
    body: String,
    timestamp: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Build an envelope from raw parts. Shape is not checked here,
    /// see [`MessageEnvelope::validate`].
    pub fn new(
        sender: impl Into<String>,
        kind: MessageKind,
        recipient: Option<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender: sender.into(),
            kind,
            recipient,
            body: body.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn broadcast(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(sender, MessageKind::Broadcast, None, body)
    }

    pub fn private(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(sender, MessageKind::Private, Some(recipient.into()), body)
    }

    /// Check the envelope shape: non-empty sender and body, and a
    /// non-empty recipient exactly when the kind is private.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.sender.is_empty() {
            return Err(SubmitError::MissingSender);
        }
        if self.body.is_empty() {
            return Err(SubmitError::EmptyBody);
        }
        match (self.kind, self.recipient.as_deref()) {
            (MessageKind::Private, Some(r)) if !r.is_empty() => Ok(()),
            (MessageKind::Private, _) => Err(SubmitError::MalformedPrivate),
            (MessageKind::Broadcast, None) => Ok(()),
            (MessageKind::Broadcast, Some(_)) => Err(SubmitError::MalformedPrivate),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_private(&self) -> bool {
        self.kind == MessageKind::Private
    }
}

impl fmt::Display for MessageEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.recipient.as_deref()) {
            (MessageKind::Private, Some(recipient)) => {
                write!(f, "(Private) {} to {}: {}", self.sender, recipient, self.body)
            }
            _ => write!(f, "{}: {}", self.sender, self.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_is_valid() {
        let env = MessageEnvelope::broadcast("alice", "hi");
        assert!(env.validate().is_ok());
        assert_eq!(env.kind(), MessageKind::Broadcast);
        assert_eq!(env.recipient(), None);
        assert_eq!(env.to_string(), "alice: hi");
    }

    #[test]
    fn test_private_renders_with_tag() {
        let env = MessageEnvelope::private("bob", "carol", "secret");
        assert!(env.validate().is_ok());
        assert!(env.is_private());
        assert_eq!(env.to_string(), "(Private) bob to carol: secret");
    }

    #[test]
    fn test_empty_body_rejected() {
        let env = MessageEnvelope::broadcast("alice", "");
        assert!(matches!(env.validate(), Err(SubmitError::EmptyBody)));
    }

    #[test]
    fn test_private_without_recipient_rejected() {
        let env = MessageEnvelope::new("bob", MessageKind::Private, None, "x");
        assert!(matches!(env.validate(), Err(SubmitError::MalformedPrivate)));

        let env = MessageEnvelope::new("bob", MessageKind::Private, Some(String::new()), "x");
        assert!(matches!(env.validate(), Err(SubmitError::MalformedPrivate)));
    }

    #[test]
    fn test_broadcast_with_recipient_rejected() {
        let env = MessageEnvelope::new("bob", MessageKind::Broadcast, Some("carol".into()), "x");
        assert!(matches!(env.validate(), Err(SubmitError::MalformedPrivate)));
    }

    #[test]
    fn test_delimiters_in_names_survive() {
        // Names containing the rendering delimiters stay in their own fields
        let env = MessageEnvelope::private("a: b", "c to d", "e: f");
        assert_eq!(env.sender(), "a: b");
        assert_eq!(env.recipient(), Some("c to d"));
        assert_eq!(env.body(), "e: f");
    }

    #[test]
    fn test_self_private_is_valid() {
        let env = MessageEnvelope::private("bob", "bob", "note to self");
        assert!(env.validate().is_ok());
    }
}
