//! # filesync protocol
//!
//! The per-connection protocol: framing, the server session state
//! machine, the chunked file transfer and the client.
//!
//! ## Overview
//!
//! A connection carries a secure channel for control traffic and a raw
//! channel, sharing the same socket, for file payloads. [`Transport`]
//! hands out one channel at a time. [`Session`] serves one connection on
//! the server; [`Client`] drives one from the other end.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use filesync_protocol::{Client, UpdateOutcome};
//! use filesync_protocol::transport::memory;
//!
//! async fn example() {
//!     let (_server_end, client_end) = memory::pair(64 * 1024);
//!     let mut client = Client::new(client_end);
//!
//!     client.sign_in("alice", "Secret_1").await.unwrap();
//!     match client.update(Path::new("shared")).await.unwrap() {
//!         UpdateOutcome::UpToDate => println!("up to date"),
//!         UpdateOutcome::Updated(report) => println!("{} files", report.files.len()),
//!     }
//! }
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Client                              Server
//!   |-------- Authorize -------------->|
//!   |<------- Success -----------------|
//!   |-------- CheckAggregateHash ----->|
//!   |<------- HashMiss ----------------|
//!   |-------- GetUpdate -------------->|
//!   |<------- name, chunks ... --------|
//!   |<------- "stop" ------------------|
//!   |<------- Success -----------------|
//! ```

pub mod client;
pub mod error;
pub mod frame;
pub mod session;
pub mod transfer;
pub mod transport;

pub use client::{Client, UpdateOutcome, UpdateReport};
pub use error::{ProtocolError, Result};
pub use frame::{read_frame, read_response, write_frame, write_request, write_response};
pub use session::{Session, SessionConfig, SessionState};
pub use transfer::{receive_files, send_files, TransferSummary, HANDSHAKE_TOKEN};
pub use transport::{memory::MemoryTransport, Plain, Transport};
