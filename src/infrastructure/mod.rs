//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Credential file
//! - Adapters: Session endpoints (console, channel)

pub mod config;
pub mod storage;
pub mod adapters;
