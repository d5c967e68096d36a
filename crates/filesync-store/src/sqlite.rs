//! SQLite implementation of the CredentialStore trait.
//!
//! This is the persistent credential backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use filesync_core::PasswordDigest;

use crate::error::{Result, StoreError};
use crate::migration;
use crate::now_millis;
use crate::traits::CredentialStore;

/// SQLite-based credential store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
#[derive(Clone)]
pub struct SqliteCredentials {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCredentials {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl CredentialStore for SqliteCredentials {
    async fn add_credential(&self, login: &str, password: &PasswordDigest) -> Result<()> {
        let login = login.to_string();
        let password = password.to_base64();

        self.blocking(move |conn| {
            let now = now_millis();
            match conn.execute(
                "INSERT INTO users (login, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![login, password, now],
            ) {
                Ok(_) => Ok(()),
                Err(e) if is_constraint_violation(&e) => Err(StoreError::Duplicate(login)),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn verify_credential(&self, login: &str, password: &PasswordDigest) -> Result<bool> {
        let login = login.to_string();
        let password = password.to_base64();

        self.blocking(move |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT password FROM users WHERE login = ?1",
                    params![login],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(stored.is_some_and(|stored| stored == password))
        })
        .await
    }

    async fn update_credential(&self, login: &str, password: &PasswordDigest) -> Result<()> {
        let login = login.to_string();
        let password = password.to_base64();

        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?2, updated_at = ?3 WHERE login = ?1",
                params![login, password, now_millis()],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(login));
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_and_verify() {
        let store = SqliteCredentials::open_memory().unwrap();
        let digest = PasswordDigest::derive("Secret_1");

        store.add_credential("alice", &digest).await.unwrap();

        assert!(store.verify_credential("alice", &digest).await.unwrap());
        assert!(!store
            .verify_credential("alice", &PasswordDigest::derive("Secret_2"))
            .await
            .unwrap());
        assert!(!store.verify_credential("bob", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_login() {
        let store = SqliteCredentials::open_memory().unwrap();
        let digest = PasswordDigest::derive("Secret_1");
        store.add_credential("alice", &digest).await.unwrap();

        let err = store
            .add_credential("alice", &PasswordDigest::derive("other"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref login) if login == "alice"));

        // The first password is untouched.
        assert!(store.verify_credential("alice", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_credential() {
        let store = SqliteCredentials::open_memory().unwrap();
        let old = PasswordDigest::derive("old_pw");
        let new = PasswordDigest::derive("new_pw");
        store.add_credential("carol", &old).await.unwrap();

        store.update_credential("carol", &new).await.unwrap();
        assert!(store.verify_credential("carol", &new).await.unwrap());
        assert!(!store.verify_credential("carol", &old).await.unwrap());

        let err = store.update_credential("dave", &new).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stores_base64_digest() {
        let store = SqliteCredentials::open_memory().unwrap();
        store
            .add_credential("alice", &PasswordDigest::derive("Secret_1"))
            .await
            .unwrap();

        let conn = store.conn.lock().unwrap();
        let stored: String = conn
            .query_row("SELECT password FROM users WHERE login = 'alice'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(
            stored,
            "U07h72k1XzQ6EFAq9CTtDwQCu2RPjYBQTcUTJ9XCYUP7dghdTLjmIjf93zpbq2jvVcMRb6uDaCq9JxCAekobcQ=="
        );
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let digest = PasswordDigest::derive("Secret_1");

        {
            let store = SqliteCredentials::open(&path).unwrap();
            store.add_credential("alice", &digest).await.unwrap();
        }

        let store = SqliteCredentials::open(&path).unwrap();
        assert!(store.verify_credential("alice", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_verifications() {
        let store = Arc::new(SqliteCredentials::open_memory().unwrap());
        let digest = PasswordDigest::derive("Secret_1");
        store.add_credential("alice", &digest).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.verify_credential("alice", &digest).await.unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
