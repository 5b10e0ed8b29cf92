//! In-process multi-user chat: a single dispatcher routes broadcast and
//! private envelopes to the live sessions of logged-in users.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::errors::{ChatError, DeliveryError, SubmitError};
pub use application::messaging::{MessageDispatcher, SessionRegistry};
pub use application::services::{ChatService, ChatSystem, SendTarget};
pub use domain::entities::{MessageEnvelope, MessageKind};
pub use domain::traits::{SessionEndpoint, UserDirectory};
