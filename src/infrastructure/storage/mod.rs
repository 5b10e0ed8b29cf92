//! Credential storage - Flat-file user directory

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::application::errors::StorageError;
use crate::domain::entities::User;
use crate::domain::traits::UserDirectory;

/// In-memory user directory
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<User> {
        self.users.read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn put(&self, user: User) {
        self.users.write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.username.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn exists(&self, username: &str) -> bool {
        self.users.read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(username)
    }

    fn verify(&self, username: &str, secret: &str) -> bool {
        self.users.read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(username)
            .map(|u| u.has_secret(secret))
            .unwrap_or(false)
    }

    fn insert(&self, username: &str, secret: &str) -> Result<(), StorageError> {
        self.put(User::new(username, secret));
        Ok(())
    }

    fn usernames(&self) -> Vec<String> {
        self.users.read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

/// User directory persisted as `username,secret` lines
pub struct FileUserDirectory {
    path: PathBuf,
    users: MemoryUserDirectory,
}

impl FileUserDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            users: MemoryUserDirectory::new(),
        }
    }

    /// Open `path` and load whatever accounts it holds
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let directory = Self::new(path);
        directory.load()?;
        Ok(directory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read accounts from disk. A missing file is an empty directory.
    pub fn load(&self) -> Result<usize, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No user file at {}, starting empty", self.path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut loaded = 0;
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match User::from_record(line) {
                Some(user) => {
                    self.users.put(user);
                    loaded += 1;
                }
                None => tracing::warn!("Skipping bad record at {}:{}", self.path.display(), number + 1),
            }
        }

        tracing::info!("Loaded {} accounts from {}", loaded, self.path.display());
        Ok(loaded)
    }

    /// Rewrite the whole file from memory
    pub fn save(&self) -> Result<(), StorageError> {
        let mut users = self.users.snapshot();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        let mut content = String::new();
        for user in &users {
            content.push_str(&user.to_record());
            content.push('\n');
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Truncate the file on disk. Accounts in memory are kept.
    pub fn clear(&self) -> Result<(), StorageError> {
        std::fs::write(&self.path, "")?;
        tracing::info!("Cleared user file {}", self.path.display());
        Ok(())
    }
}

impl UserDirectory for FileUserDirectory {
    fn exists(&self, username: &str) -> bool {
        self.users.exists(username)
    }

    fn verify(&self, username: &str, secret: &str) -> bool {
        self.users.verify(username, secret)
    }

    fn insert(&self, username: &str, secret: &str) -> Result<(), StorageError> {
        self.users.insert(username, secret)?;
        self.save()
    }

    fn usernames(&self) -> Vec<String> {
        self.users.usernames()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let directory = FileUserDirectory::open(dir.path().join("users.txt")).unwrap();
        assert!(directory.usernames().is_empty());
    }

    #[test]
    fn test_insert_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");

        let directory = FileUserDirectory::open(&path).unwrap();
        directory.insert("bob", "b,1").unwrap();
        directory.insert("alice", "a1").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alice,a1\nbob,b,1\n");

        let reloaded = FileUserDirectory::open(&path).unwrap();
        assert!(reloaded.exists("alice"));
        assert!(reloaded.verify("bob", "b,1"));
        assert!(!reloaded.verify("bob", "b"));
        assert!(!reloaded.verify("carol", ""));
    }

    #[test]
    fn test_bad_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");
        std::fs::write(&path, "alice,a1\n\ngarbage\ncarol,c1\n").unwrap();

        let directory = FileUserDirectory::new(&path);
        assert_eq!(directory.load().unwrap(), 2);
        assert!(directory.exists("carol"));
        assert!(!directory.exists("garbage"));
    }

    #[test]
    fn test_clear_truncates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");

        let directory = FileUserDirectory::open(&path).unwrap();
        directory.insert("alice", "a1").unwrap();
        directory.clear().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(directory.exists("alice"));
    }
}
