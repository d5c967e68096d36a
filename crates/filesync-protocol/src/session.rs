//! Server-side session state machine.
//!
//! One [`Session`] owns one connection. It reads a request, answers it,
//! and repeats until the peer goes away:
//!
//! ```text
//! Unauthenticated --Authorize ok--> Authenticated
//!        |                               |
//!        +-------- EOF / error ----------+--> Closed
//! ```
//!
//! Register, Ping and CheckAggregateHash are legal in both states.
//! GetUpdate needs Authenticated. Anything the client can be told about
//! becomes a [`Response`]; only errors that leave the byte stream in an
//! unknown position end the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use filesync_core::{
    decode_request, files_to_send, limits, validate_credentials, CodecError, Command, CoreError,
    PasswordDigest, Response, Status,
};
use filesync_store::{CredentialStore, Inventory};

use crate::error::Result;
use crate::frame::{read_frame, write_response};
use crate::transfer::{send_files, send_stop};
use crate::transport::Transport;

pub(crate) const PING_REPLY: &str = "Server response";
pub(crate) const WRONG_CREDENTIALS: &str = "Wrong password or login";
pub(crate) const BAD_CREDENTIAL_FORMAT: &str = "Login or password was in incorrect format";
pub(crate) const SIGN_IN_REQUIRED: &str = "you need to sign in before downloading the update";
pub(crate) const UNKNOWN_REQUEST: &str = "Failed to process request: invalid message id";

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Per-session limits.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Largest control frame accepted from the peer.
    pub max_frame_len: usize,
    /// Payload bytes per transfer chunk, at most 1 MiB.
    pub chunk_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_len: limits::DEFAULT_MAX_FRAME_LEN,
            chunk_size: limits::MAX_CHUNK_LEN,
        }
    }
}

/// Authentication state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated { login: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// One client connection on the server.
pub struct Session<T: Transport, C: CredentialStore> {
    id: u64,
    transport: T,
    credentials: C,
    inventory: Arc<Inventory>,
    config: SessionConfig,
    state: SessionState,
}

impl<T: Transport, C: CredentialStore> Session<T, C> {
    /// Create a session over an already-upgraded transport.
    pub fn new(transport: T, credentials: C, inventory: Arc<Inventory>, config: SessionConfig) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            transport,
            credentials,
            inventory,
            config,
            state: SessionState::Unauthenticated,
        }
    }

    /// Process-unique, increasing session id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Serve requests until the peer disconnects.
    ///
    /// A clean disconnect returns `Ok`. Any other error means the
    /// connection is no longer usable and should be dropped.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let frame = match read_frame(self.transport.secure(), self.config.max_frame_len).await {
                Ok(frame) => frame,
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("peer disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            self.handle_frame(&frame).await?;
        }
    }

    async fn handle_frame(&mut self, frame: &[u8]) -> Result<()> {
        let request = match decode_request(frame) {
            Ok(request) => request,
            Err(CodecError::UnknownKind(kind)) => {
                tracing::debug!("unknown request kind {}", kind);
                return self
                    .reply(Response::new(Status::IncorrectInput, UNKNOWN_REQUEST))
                    .await;
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!("request {:?} with {} fields", request.kind, request.fields.len());

        let command = match request.command() {
            Ok(command) => command,
            Err(CoreError::UnpairedField(n)) => {
                // The client is already waiting on the transfer stream.
                send_stop(&mut self.transport).await?;
                let message = CoreError::UnpairedField(n).to_string();
                return self
                    .reply(Response::new(Status::IncorrectInput, message))
                    .await;
            }
            Err(e) => {
                return self
                    .reply(Response::new(Status::IncorrectInput, e.to_string()))
                    .await;
            }
        };

        let response = match command {
            Command::Ping => Response::new(Status::Success, PING_REPLY),
            Command::Authorize { login, password } => self.authorize(login, &password).await,
            Command::Register { login, password } => self.register(&login, &password).await,
            Command::CheckAggregateHash { digest } => self.check_aggregate(&digest),
            Command::GetUpdate { entries } => return self.handle_update(entries).await,
        };
        self.reply(response).await
    }

    fn check_aggregate(&self, digest: &str) -> Response {
        if self.inventory.snapshot().matches_aggregate(digest) {
            Response::success()
        } else {
            Response::new(Status::HashMiss, String::new())
        }
    }

    async fn authorize(&mut self, login: String, password: &str) -> Response {
        if self.state.is_authenticated() {
            return Response::new(Status::AlreadyAuthorized, String::new());
        }

        let digest = PasswordDigest::derive(password);
        match self.credentials.verify_credential(&login, &digest).await {
            Ok(true) => {
                tracing::info!("{} signed in", login);
                self.state = SessionState::Authenticated { login };
                Response::success()
            }
            Ok(false) => Response::new(Status::IncorrectInput, WRONG_CREDENTIALS),
            Err(e) => {
                tracing::warn!("credential check failed: {}", e);
                Response::new(Status::Fail, e.to_string())
            }
        }
    }

    async fn register(&mut self, login: &str, password: &str) -> Response {
        if let Err(e) = validate_credentials(login, password) {
            tracing::debug!("registration refused: {}", e);
            return Response::new(Status::IncorrectInput, BAD_CREDENTIAL_FORMAT);
        }

        let digest = PasswordDigest::derive(password);
        match self.credentials.add_credential(login, &digest).await {
            Ok(()) => {
                tracing::info!("registered {}", login);
                Response::success()
            }
            Err(e) => {
                tracing::warn!("registration of {} failed: {}", login, e);
                Response::new(Status::Fail, e.to_string())
            }
        }
    }

    async fn handle_update(&mut self, entries: Vec<(String, String)>) -> Result<()> {
        if !self.state.is_authenticated() {
            send_stop(&mut self.transport).await?;
            return self
                .reply(Response::new(Status::NotAuthorized, SIGN_IN_REQUIRED))
                .await;
        }

        let inventory = self.inventory.snapshot();
        let outgoing = files_to_send(&inventory, &entries);
        tracing::debug!(
            "client holds {} files, sending {}",
            entries.len(),
            outgoing.len()
        );

        // A failure here leaves the client mid-stream; the session ends.
        let summary = send_files(&mut self.transport, &outgoing, self.config.chunk_size).await?;
        tracing::info!(
            "update sent {} files ({} bytes)",
            summary.files.len(),
            summary.bytes
        );

        self.reply(Response::success()).await
    }

    async fn reply(&mut self, response: Response) -> Result<()> {
        write_response(self.transport.secure(), &response).await
    }
}
