//! Error types for filesync core.

use thiserror::Error;

/// Core errors outside of wire decoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("request {kind:?} expects {expected} fields, got {got}")]
    FieldCount {
        kind: crate::messages::RequestKind,
        expected: usize,
        got: usize,
    },

    #[error("update request carries an odd number of fields ({0})")]
    UnpairedField(usize),
}

/// Errors produced while decoding a control-channel payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not a well-formed message. Fatal for the connection.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The payload is well-formed but names a request kind we do not know.
    #[error("unknown request kind: {0}")]
    UnknownKind(u64),

    /// The payload is well-formed but carries an unknown status code.
    #[error("unknown status code: {0}")]
    UnknownStatus(u64),
}

/// Credential format violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("login must not be empty")]
    EmptyLogin,

    #[error("login exceeds {max} characters ({len})")]
    LoginTooLong { len: usize, max: usize },

    #[error("login contains disallowed character {0:?}")]
    LoginCharacter(char),

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("password exceeds {max} characters ({len})")]
    PasswordTooLong { len: usize, max: usize },

    #[error("password contains disallowed character {0:?}")]
    PasswordCharacter(char),

    /// A file name that cannot travel in an update.
    #[error("file name {0:?} cannot be transferred")]
    FileName(String),
}
