use std::sync::Arc;

use crate::application::errors::{AuthError, SubmitError};
use crate::application::messaging::{EnvelopeQueue, SessionRegistry};
use crate::domain::entities::MessageEnvelope;
use crate::domain::traits::{SessionEndpoint, UserDirectory};

/// Who a message goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget {
    Everyone,
    User(String),
}

/// Producer-side service: accounts, session lifecycle and message submission
#[derive(Clone)]
pub struct ChatService {
    directory: Arc<dyn UserDirectory>,
    registry: Arc<SessionRegistry>,
    queue: EnvelopeQueue,
}

impl ChatService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        registry: Arc<SessionRegistry>,
        queue: EnvelopeQueue,
    ) -> Self {
        Self { directory, registry, queue }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &EnvelopeQueue {
        &self.queue
    }

    /// Create a new account
    pub fn register_account(&self, username: &str, secret: &str) -> Result<(), AuthError> {
        if username.is_empty() || secret.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if self.directory.exists(username) {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        self.directory.insert(username, secret)?;
        tracing::info!("Registered account: {}", username);
        Ok(())
    }

    /// Authenticate and open a chat session.
    ///
    /// Returns `Ok(false)` if the user already had a session; the existing
    /// endpoint stays in place.
    pub fn open_session(
        &self,
        username: &str,
        secret: &str,
        endpoint: Arc<dyn SessionEndpoint>,
    ) -> Result<bool, AuthError> {
        if !self.directory.verify(username, secret) {
            tracing::debug!("Rejected login for {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.registry.register(username, endpoint))
    }

    /// Close the session of `username`, if any
    pub fn close_session(&self, username: &str) -> bool {
        self.registry.unregister(username)
    }

    /// Validate a message locally and queue it.
    ///
    /// The recipient check here is against the directory only; whether the
    /// recipient is online is decided at dispatch time.
    pub fn send(&self, sender: &str, target: SendTarget, body: &str) -> Result<(), SubmitError> {
        if body.is_empty() {
            return Err(SubmitError::EmptyBody);
        }

        let envelope = match target {
            SendTarget::Everyone => MessageEnvelope::broadcast(sender, body),
            SendTarget::User(recipient) => {
                if recipient.is_empty() {
                    return Err(SubmitError::MalformedPrivate);
                }
                if !self.directory.exists(&recipient) {
                    return Err(SubmitError::UnknownRecipient(recipient));
                }
                MessageEnvelope::private(sender, recipient, body)
            }
        };

        self.queue.submit(envelope)
    }

    /// Users with an open session, sorted
    pub fn online_users(&self) -> Vec<String> {
        self.registry.usernames()
    }

    /// Everyone in the directory except `username`, sorted
    pub fn contacts(&self, username: &str) -> Vec<String> {
        let mut names: Vec<String> = self.directory
            .usernames()
            .into_iter()
            .filter(|name| name != username)
            .collect();
        names.sort();
        names
    }

    pub fn has_session(&self, username: &str) -> bool {
        self.registry.is_registered(username)
    }
}
