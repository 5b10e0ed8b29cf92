//! Domain entities - Core chat objects with no external dependencies

pub mod user;
pub mod envelope;
pub mod command;

pub use user::User;
pub use envelope::{MessageEnvelope, MessageKind};
pub use command::{Command, CommandRegistry};
