//! Domain layer - Core chat model
//! 
//! This layer contains:
//! - Entities: Core objects (User, MessageEnvelope, Command)
//! - Traits: Abstractions for collaborators (SessionEndpoint, UserDirectory)

pub mod entities;
pub mod traits;
