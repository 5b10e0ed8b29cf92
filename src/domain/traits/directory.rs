use crate::application::errors::StorageError;

/// UserDirectory trait - username to credential lookup
pub trait UserDirectory: Send + Sync {
    /// Whether an account exists for `username`
    fn exists(&self, username: &str) -> bool;

    /// Whether `secret` matches the stored credential of `username`
    fn verify(&self, username: &str, secret: &str) -> bool;

    /// Store a new account. Callers check for duplicates first.
    fn insert(&self, username: &str, secret: &str) -> Result<(), StorageError>;

    /// All known usernames, in no particular order
    fn usernames(&self) -> Vec<String>;
}
