//! Domain traits - Abstractions for collaborators around the dispatch core

pub mod endpoint;
pub mod directory;

pub use endpoint::SessionEndpoint;
pub use directory::UserDirectory;
