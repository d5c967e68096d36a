//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use filesync_protocol::transport::memory;
use filesync_protocol::{Client, MemoryTransport, Session, SessionConfig};
use filesync_store::{Inventory, MemoryCredentials};

/// A temporary directory removed on drop.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Create a directory holding `files` as `(name, content)` pairs.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let dir = Self::new();
        for (name, content) in files {
            dir.write(name, content.as_bytes());
        }
        dir
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of `name` inside the directory.
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &[u8]) {
        fs::write(self.join(name), content).expect("write fixture file");
    }

    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.join(name)).expect("read fixture file")
    }

    /// Names of the regular files in the directory, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("list fixture dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Start a session serving `dir` over an in-memory pipe and return a
/// client connected to it.
///
/// Must be called inside a tokio runtime.
pub fn connect_memory(dir: &Path) -> Client<MemoryTransport> {
    connect_memory_with(dir, Arc::new(MemoryCredentials::new()))
}

/// Like [`connect_memory`], with a credential store shared between
/// several connections.
pub fn connect_memory_with(
    dir: &Path,
    credentials: Arc<MemoryCredentials>,
) -> Client<MemoryTransport> {
    let inventory = Arc::new(Inventory::open(dir).expect("open inventory"));
    let (server, client) = memory::pair(64 * 1024);
    let session = Session::new(server, credentials, inventory, SessionConfig::default());
    tokio::spawn(session.run());
    Client::new(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_with_files() {
        let dir = TestDir::with_files(&[("b.txt", "beta"), ("a.txt", "alpha")]);
        assert_eq!(dir.names(), vec!["a.txt", "b.txt"]);
        assert_eq!(dir.read("a.txt"), b"alpha");
    }

    #[tokio::test]
    async fn test_connect_memory_answers_ping() {
        let dir = TestDir::new();
        let mut client = connect_memory(dir.path());
        let response = client.ping().await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.message, "Server response");
    }

    #[tokio::test]
    async fn test_shared_credentials() {
        let dir = TestDir::new();
        let credentials = Arc::new(MemoryCredentials::new());

        let mut first = connect_memory_with(dir.path(), credentials.clone());
        assert!(first.sign_up("alice", "Secret_1").await.unwrap().is_success());

        let mut second = connect_memory_with(dir.path(), credentials);
        assert!(second.sign_in("alice", "Secret_1").await.unwrap().is_success());
    }
}
