//! # filesync core
//!
//! Pure primitives for filesync: digests, wire messages, the
//! control-channel codec, credential format rules and inventory
//! reconciliation.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`Request`] / [`Response`] - Control-channel messages
//! - [`Command`] - A request with its positional fields interpreted
//! - [`FileInventory`] - Name-ordered file digests plus their aggregate
//! - [`PasswordDigest`] - What the credential store receives instead of a password
//!
//! ## Encoding
//!
//! Messages are encoded as deterministic CBOR. See [`codec`].

pub mod codec;
pub mod digest;
pub mod error;
pub mod inventory;
pub mod messages;
pub mod reconcile;
pub mod validation;

pub use codec::{decode_request, decode_response, encode_request, encode_response};
pub use digest::{aggregate_digest, ContentHasher, PasswordDigest, Sha512Digest, DIGEST_BASE64_LEN};
pub use error::{CodecError, CoreError, ValidationError};
pub use inventory::{FileInventory, FileRecord};
pub use messages::{limits, Command, Request, RequestKind, Response, Status, STOP_SENTINEL};
pub use reconcile::files_to_send;
pub use validation::{
    validate_credentials, validate_file_name, validate_login, validate_password,
};
