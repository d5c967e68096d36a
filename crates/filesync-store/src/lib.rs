//! # filesync store
//!
//! Server-side state for filesync: the credential database and the
//! managed directory's inventory.
//!
//! ## Overview
//!
//! Credentials sit behind the [`CredentialStore`] trait so the session
//! code is storage-agnostic. The persistent implementation is
//! [`SqliteCredentials`], with [`MemoryCredentials`] for testing.
//! [`Inventory`] scans the managed directory and publishes immutable
//! [`FileInventory`](filesync_core::FileInventory) snapshots.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use filesync_core::PasswordDigest;
//! use filesync_store::{CredentialStore, Inventory, SqliteCredentials};
//!
//! async fn example() {
//!     let users = SqliteCredentials::open("users.db").unwrap();
//!     let digest = PasswordDigest::derive("Secret_1");
//!     users.add_credential("alice", &digest).await.unwrap();
//!
//!     let inventory = Inventory::open("shared").unwrap();
//!     println!("aggregate: {}", inventory.snapshot().aggregate_digest());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Digests only**: stores never see plaintext passwords
//! - **Republish by value**: a rescan swaps in a whole new inventory

pub mod error;
pub mod inventory;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use inventory::{hash_file, scan_directory, Inventory};
pub use memory::MemoryCredentials;
pub use sqlite::SqliteCredentials;
pub use traits::CredentialStore;

/// Current time as Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
