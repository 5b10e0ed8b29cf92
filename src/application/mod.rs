//! Application layer - Use cases and chat logic
//! 
//! This layer contains:
//! - Services: Accounts, sessions, message submission, commands
//! - Errors: Domain-specific errors
//! - Messaging: Envelope queue, session registry, dispatching

pub mod errors;
pub mod services;
pub mod messaging;
