//! # filesync
//!
//! Authenticated one-way directory synchronization: a server publishes a
//! directory, clients sign in and download whatever they are missing.
//!
//! ## Overview
//!
//! - **Inventory**: the server keeps name-ordered SHA-512 digests of its
//!   files plus one aggregate digest over all of them
//! - **Sessions**: each connection is one task with its own sign-in state
//! - **Updates**: the client sends its own `(name, digest)` pairs and
//!   receives every file the server holds that is not among them
//! - **Transport**: control traffic runs over TLS; file payloads run on
//!   the raw socket underneath, fenced by handshake tokens
//!
//! ## Usage
//!
//! ```rust,no_run
//! use filesync::{Server, ServerConfig, TlsConfig};
//!
//! async fn example() {
//!     let config = ServerConfig {
//!         data_dir: "data".into(),
//!         tls: Some(TlsConfig {
//!             cert_chain: "server.crt".into(),
//!             private_key: "server.key".into(),
//!         }),
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = Server::open(config).unwrap();
//!     server
//!         .run(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `filesync::core` - Digests, messages, codec, reconciliation
//! - `filesync::store` - Credential stores and the inventory scanner
//! - `filesync::protocol` - Sessions, transfer and the client

pub mod config;
pub mod error;
pub mod listener;
pub mod server;
pub mod tls;

// Re-export component crates
pub use filesync_core as core;
pub use filesync_protocol as protocol;
pub use filesync_store as store;

// Re-export main types for convenience
pub use config::{CredentialsConfig, ServerConfig, TlsConfig, DEFAULT_PORT};
pub use error::{Result, ServerError};
pub use listener::{serve, PlainUpgrade, Shared, Upgrade};
pub use server::{Credentials, Server};
pub use tls::{connect_plain, connect_tls, load_root_store, TlsUpgrade};

pub use filesync_protocol::{Client, UpdateOutcome, UpdateReport};
