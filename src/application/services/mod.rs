//! Application services - Session-side orchestration

pub mod chat_service;
pub mod command_service;
pub mod system;

pub use chat_service::{ChatService, SendTarget};
pub use command_service::CommandService;
pub use system::ChatSystem;
