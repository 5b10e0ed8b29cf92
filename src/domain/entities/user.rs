use std::fmt;

/// A chat account as kept by the user directory
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    pub username: String,
    pub secret: String,
}

impl User {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    /// Parse a `username,secret` record. Only the first comma splits.
    pub fn from_record(line: &str) -> Option<Self> {
        let (username, secret) = line.split_once(',')?;
        if username.is_empty() {
            return None;
        }
        Some(Self::new(username, secret))
    }

    pub fn to_record(&self) -> String {
        format!("{},{}", self.username, self.secret)
    }

    pub fn has_secret(&self, secret: &str) -> bool {
        self.secret == secret
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}
