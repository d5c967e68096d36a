//! CredentialStore trait: the capability the session uses to check users.
//!
//! The session never sees stored credentials. It hands over a login and
//! an already-digested password and gets back a verdict, so stores can be
//! swapped without touching the protocol code.

use async_trait::async_trait;
use filesync_core::PasswordDigest;

use crate::error::Result;

/// Async interface to the credential database.
///
/// Implementations must tolerate concurrent independent calls; callers
/// add no locking of their own.
///
/// # Design Notes
///
/// - **Digests only**: every method takes a [`PasswordDigest`], never a
///   plaintext password.
/// - **Unknown logins verify as `false`**, so a caller cannot tell a
///   wrong password from a missing user.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Add a new credential.
    ///
    /// Fails with [`StoreError::Duplicate`](crate::StoreError::Duplicate)
    /// if the login is taken.
    async fn add_credential(&self, login: &str, password: &PasswordDigest) -> Result<()>;

    /// Check a login/password pair.
    async fn verify_credential(&self, login: &str, password: &PasswordDigest) -> Result<bool>;

    /// Replace the password of an existing login.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound)
    /// if the login does not exist.
    async fn update_credential(&self, login: &str, password: &PasswordDigest) -> Result<()>;
}

#[async_trait]
impl<S: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<S> {
    async fn add_credential(&self, login: &str, password: &PasswordDigest) -> Result<()> {
        (**self).add_credential(login, password).await
    }

    async fn verify_credential(&self, login: &str, password: &PasswordDigest) -> Result<bool> {
        (**self).verify_credential(login, password).await
    }

    async fn update_credential(&self, login: &str, password: &PasswordDigest) -> Result<()> {
        (**self).update_credential(login, password).await
    }
}
