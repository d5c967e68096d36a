//! Control-channel message types.
//!
//! A [`Request`] is what travels on the wire: a kind tag plus positional
//! string fields. [`Request::command`] turns it into a typed [`Command`]
//! for dispatch. A [`Response`] carries a [`Status`] and a message.

use std::fmt;

use crate::error::CoreError;

/// Protocol constants shared by client and server.
pub mod limits {
    /// Max characters in a login.
    pub const MAX_LOGIN_LEN: usize = 25;
    /// Max characters in a password.
    pub const MAX_PASSWORD_LEN: usize = 255;
    /// Max payload bytes in one transfer chunk (1 MiB).
    pub const MAX_CHUNK_LEN: usize = 0x10_0000;
    /// Default max control frame length accepted from a peer.
    pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 0x10_0000;
}

/// Marker ending the file list of an update, sent in place of a file name.
pub const STOP_SENTINEL: &str = "stop";

/// Request kinds with their stable wire discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestKind {
    Authorize = 0,
    Register = 1,
    Ping = 2,
    CheckAggregateHash = 3,
    GetUpdate = 4,
}

impl RequestKind {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Authorize),
            1 => Some(Self::Register),
            2 => Some(Self::Ping),
            3 => Some(Self::CheckAggregateHash),
            4 => Some(Self::GetUpdate),
            _ => None,
        }
    }
}

/// A request as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub kind: RequestKind,
    pub fields: Vec<String>,
}

impl Request {
    pub fn new(kind: RequestKind, fields: Vec<String>) -> Self {
        Self { kind, fields }
    }

    pub fn ping() -> Self {
        Self::new(RequestKind::Ping, Vec::new())
    }

    pub fn authorize(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(RequestKind::Authorize, vec![login.into(), password.into()])
    }

    pub fn register(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new(RequestKind::Register, vec![login.into(), password.into()])
    }

    pub fn check_aggregate_hash(digest: impl Into<String>) -> Self {
        Self::new(RequestKind::CheckAggregateHash, vec![digest.into()])
    }

    /// Build an update request from `(name, digest)` pairs.
    ///
    /// Pairs are flattened so names sit at even positions and digests at
    /// odd positions.
    pub fn get_update<I, N, D>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        let fields = entries
            .into_iter()
            .flat_map(|(name, digest)| [name.into(), digest.into()])
            .collect();
        Self::new(RequestKind::GetUpdate, fields)
    }

    /// Interpret the positional fields for this request's kind.
    pub fn command(self) -> Result<Command, CoreError> {
        let kind = self.kind;
        let mut fields = self.fields;
        let expect = |fields: &Vec<String>, expected: usize| {
            if fields.len() == expected {
                Ok(())
            } else {
                Err(CoreError::FieldCount {
                    kind,
                    expected,
                    got: fields.len(),
                })
            }
        };

        match kind {
            RequestKind::Ping => Ok(Command::Ping),
            RequestKind::Authorize => {
                expect(&fields, 2)?;
                let password = fields.pop().unwrap_or_default();
                let login = fields.pop().unwrap_or_default();
                Ok(Command::Authorize { login, password })
            }
            RequestKind::Register => {
                expect(&fields, 2)?;
                let password = fields.pop().unwrap_or_default();
                let login = fields.pop().unwrap_or_default();
                Ok(Command::Register { login, password })
            }
            RequestKind::CheckAggregateHash => {
                expect(&fields, 1)?;
                Ok(Command::CheckAggregateHash {
                    digest: fields.pop().unwrap_or_default(),
                })
            }
            RequestKind::GetUpdate => {
                if fields.len() % 2 != 0 {
                    return Err(CoreError::UnpairedField(fields.len()));
                }
                let mut entries = Vec::with_capacity(fields.len() / 2);
                let mut iter = fields.into_iter();
                while let (Some(name), Some(digest)) = (iter.next(), iter.next()) {
                    entries.push((name, digest));
                }
                Ok(Command::GetUpdate { entries })
            }
        }
    }
}

/// A request with its fields interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping,
    Authorize { login: String, password: String },
    Register { login: String, password: String },
    CheckAggregateHash { digest: String },
    /// Client inventory as `(name, digest)` pairs.
    GetUpdate { entries: Vec<(String, String)> },
}

/// Response status codes with their stable wire discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Status {
    Success = 0,
    IncorrectInput = 1,
    HashMiss = 2,
    NotAuthorized = 3,
    AlreadyAuthorized = 4,
    Fail = 5,
}

impl Status {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Success),
            1 => Some(Self::IncorrectInput),
            2 => Some(Self::HashMiss),
            3 => Some(Self::NotAuthorized),
            4 => Some(Self::AlreadyAuthorized),
            5 => Some(Self::Fail),
            _ => None,
        }
    }

    /// Short human-readable name.
    pub fn describe(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::IncorrectInput => "incorrect input",
            Status::HashMiss => "hash miss",
            Status::NotAuthorized => "not authorized",
            Status::AlreadyAuthorized => "already authorized",
            Status::Fail => "fail",
        }
    }
}

/// A response to a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub message: String,
}

impl Response {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A success response with an empty message.
    pub fn success() -> Self {
        Self::new(Status::Success, String::new())
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success() {
            return f.write_str("operation successfully completed");
        }
        write!(f, "operation failed ({})", self.status.describe())?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}
