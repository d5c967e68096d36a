//! The Server: ties credentials, the managed directory and the listener
//! together.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use filesync_core::{validate_password, FileInventory, PasswordDigest};
use filesync_store::{CredentialStore, Inventory, MemoryCredentials, SqliteCredentials};

use crate::config::{CredentialsConfig, ServerConfig};
use crate::error::{Result, ServerError};
use crate::listener::{serve, PlainUpgrade, Shared, Upgrade};
use crate::tls::TlsUpgrade;

/// Shared credential handle used by every session.
pub type Credentials = Arc<dyn CredentialStore>;

/// A filesync server.
///
/// Owns the published inventory and the credential store. Sessions get
/// shared handles to both; nothing else is shared between them.
pub struct Server {
    config: ServerConfig,
    shared: Arc<Shared<Credentials>>,
}

impl Server {
    /// Open the managed directory and the configured credential store.
    pub fn open(config: ServerConfig) -> Result<Self> {
        let credentials: Credentials = match &config.credentials {
            CredentialsConfig::Memory => Arc::new(MemoryCredentials::new()),
            CredentialsConfig::Sqlite(path) => Arc::new(SqliteCredentials::open(path)?),
        };
        Self::with_credentials(config, credentials)
    }

    /// Open the managed directory with a caller-supplied credential store.
    pub fn with_credentials(config: ServerConfig, credentials: Credentials) -> Result<Self> {
        let inventory = Arc::new(Inventory::open(&config.data_dir)?);
        let shared = Arc::new(Shared {
            credentials,
            inventory,
            session: config.session.clone(),
        });
        Ok(Self { config, shared })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.shared.inventory
    }

    pub fn credentials(&self) -> &Credentials {
        &self.shared.credentials
    }

    /// Rescan the managed directory and publish the result.
    ///
    /// Sessions in flight keep the snapshot they already hold.
    pub async fn rescan(&self) -> Result<Arc<FileInventory>> {
        let inventory = self.shared.inventory.clone();
        let fresh = tokio::task::spawn_blocking(move || inventory.rescan())
            .await
            .map_err(|e| ServerError::Task(e.to_string()))??;
        Ok(fresh)
    }

    /// Replace the password of an existing account.
    pub async fn update_password(&self, login: &str, password: &str) -> Result<()> {
        validate_password(password)?;
        let digest = PasswordDigest::derive(password);
        self.shared
            .credentials
            .update_credential(login, &digest)
            .await?;
        tracing::info!("password updated for {}", login);
        Ok(())
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.run_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener.
    pub async fn run_on<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        match &self.config.tls {
            Some(tls) => {
                let upgrade = Arc::new(TlsUpgrade::from_config(tls)?);
                serve(listener, upgrade, self.shared.clone(), shutdown).await?;
            }
            None => {
                tracing::warn!("serving without TLS");
                serve(listener, Arc::new(PlainUpgrade), self.shared.clone(), shutdown).await?;
            }
        }
        Ok(())
    }

    /// Serve with an explicit upgrade, overriding the TLS configuration.
    pub async fn run_with<U, F>(&self, listener: TcpListener, upgrade: U, shutdown: F) -> Result<()>
    where
        U: Upgrade,
        F: Future<Output = ()>,
    {
        serve(listener, Arc::new(upgrade), self.shared.clone(), shutdown).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> ServerConfig {
        ServerConfig {
            data_dir: dir.to_path_buf(),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_rescan_publishes_new_files() {
        let tmp = tempfile::tempdir().unwrap();
        let server = Server::open(config(tmp.path())).unwrap();
        assert!(server.inventory().snapshot().is_empty());

        std::fs::write(tmp.path().join("new.txt"), b"fresh").unwrap();
        let fresh = server.rescan().await.unwrap();

        assert_eq!(fresh.len(), 1);
        assert_eq!(server.inventory().snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_update_password() {
        let tmp = tempfile::tempdir().unwrap();
        let server = Server::open(config(tmp.path())).unwrap();
        let credentials = server.credentials();
        credentials
            .add_credential("alice", &PasswordDigest::derive("old_pw"))
            .await
            .unwrap();

        server.update_password("alice", "new_pw").await.unwrap();

        assert!(credentials
            .verify_credential("alice", &PasswordDigest::derive("new_pw"))
            .await
            .unwrap());
        assert!(matches!(
            server.update_password("alice", "bad pw").await,
            Err(ServerError::Validation(_))
        ));
        assert!(matches!(
            server.update_password("nobody", "pw").await,
            Err(ServerError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_credentials_from_config() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("users.db");
        let cfg = ServerConfig {
            credentials: CredentialsConfig::Sqlite(db.clone()),
            ..config(&tmp.path().join("data"))
        };

        let server = Server::open(cfg).unwrap();
        server
            .credentials()
            .add_credential("alice", &PasswordDigest::derive("Secret_1"))
            .await
            .unwrap();

        assert!(db.exists());
    }
}
