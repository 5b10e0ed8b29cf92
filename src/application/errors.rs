//! Application layer errors

use std::time::Duration;
use thiserror::Error;

/// General chat errors
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Submission rejected: {0}")]
    Submit(#[from] SubmitError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reasons a message is refused before it reaches the queue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("message body is empty")]
    EmptyBody,

    #[error("private message without a recipient")]
    MalformedPrivate,

    #[error("message has no sender")]
    MissingSender,

    #[error("recipient does not exist: {0}")]
    UnknownRecipient(String),
}

/// Failure to push an envelope into a session endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("session closed: {0}")]
    Closed(String),

    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Account and session errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter username and password")]
    MissingCredentials,

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("No open session for {0}")]
    NoActiveSession(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<AuthError> for CommandError {
    fn from(err: AuthError) -> Self {
        CommandError::ExecutionFailed(err.to_string())
    }
}

impl From<SubmitError> for CommandError {
    fn from(err: SubmitError) -> Self {
        CommandError::ExecutionFailed(err.to_string())
    }
}
