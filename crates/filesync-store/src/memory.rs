//! In-memory implementation of the CredentialStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use filesync_core::PasswordDigest;

use crate::error::{Result, StoreError};
use crate::traits::CredentialStore;

/// In-memory credential store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryCredentials {
    /// login -> base64 password digest.
    users: RwLock<HashMap<String, String>>,
}

impl MemoryCredentials {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCredentials {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentials {
    async fn add_credential(&self, login: &str, password: &PasswordDigest) -> Result<()> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.contains_key(login) {
            return Err(StoreError::Duplicate(login.to_string()));
        }
        users.insert(login.to_string(), password.to_base64());
        Ok(())
    }

    async fn verify_credential(&self, login: &str, password: &PasswordDigest) -> Result<bool> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        Ok(users
            .get(login)
            .is_some_and(|stored| *stored == password.to_base64()))
    }

    async fn update_credential(&self, login: &str, password: &PasswordDigest) -> Result<()> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        match users.get_mut(login) {
            Some(stored) => {
                *stored = password.to_base64();
                Ok(())
            }
            None => Err(StoreError::NotFound(login.to_string())),
        }
    }
}
