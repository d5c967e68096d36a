//! # filesync testkit
//!
//! Testing utilities for filesync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Known-answer vectors**: digests and frames with their expected encodings
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Temporary directories and in-memory sessions
//!
//! ## Vectors
//!
//! ```rust
//! use filesync_testkit::vectors::verify_all_vectors;
//!
//! for (name, ok, actual) in verify_all_vectors() {
//!     assert!(ok, "{} produced {}", name, actual);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use filesync_core::{decode_request, encode_request};
//! use filesync_testkit::generators::request;
//!
//! proptest! {
//!     #[test]
//!     fn request_survives_codec(req in request()) {
//!         prop_assert_eq!(decode_request(&encode_request(&req)).unwrap(), req);
//!     }
//! }
//! ```
//!
//! ## Fixtures
//!
//! ```rust,no_run
//! use filesync_testkit::fixtures::{connect_memory, TestDir};
//!
//! async fn example() {
//!     let server = TestDir::with_files(&[("a.txt", "hello world")]);
//!     let mut client = connect_memory(server.path());
//!     assert!(client.ping().await.unwrap().is_success());
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{connect_memory, connect_memory_with, TestDir};
pub use generators::{request, response};
pub use vectors::{all_vectors, verify_all_vectors, KnownAnswer};
