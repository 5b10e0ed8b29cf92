//! Session endpoint adapters

pub mod channel;
pub mod console;
