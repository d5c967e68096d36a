//! Client side of the protocol.
//!
//! [`Client`] wraps an upgraded [`Transport`] and issues one request at a
//! time. [`Client::update`] runs the whole update flow: scan the local
//! directory, compare aggregates, and receive whatever differs.

use std::io;
use std::path::{Path, PathBuf};

use filesync_core::{limits, validate_credentials, Request, Response, Status};
use filesync_store::scan_directory;

use crate::error::Result;
use crate::frame::{read_response, write_request};
use crate::session::BAD_CREDENTIAL_FORMAT;
use crate::transfer::receive_files;
use crate::transport::Transport;

/// What an update run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The aggregates matched; nothing was requested.
    UpToDate,
    /// Files were requested and the server answered.
    Updated(UpdateReport),
}

/// Result of one GetUpdate exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// Names written into the local directory, in transfer order.
    pub files: Vec<String>,
    /// Payload bytes received.
    pub bytes: u64,
    /// The server's final response.
    pub response: Response,
}

/// A connected filesync client.
pub struct Client<T: Transport> {
    transport: T,
    max_frame_len: usize,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_frame_len: limits::DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// Set the largest response frame accepted from the server.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Send a request and wait for its response.
    ///
    /// Not for GetUpdate, whose response follows a file stream; use
    /// [`Client::request_update`].
    pub async fn call(&mut self, request: &Request) -> Result<Response> {
        write_request(self.transport.secure(), request).await?;
        read_response(self.transport.secure(), self.max_frame_len).await
    }

    pub async fn ping(&mut self) -> Result<Response> {
        self.call(&Request::ping()).await
    }

    pub async fn sign_in(&mut self, login: &str, password: &str) -> Result<Response> {
        self.call(&Request::authorize(login, password)).await
    }

    /// Register a new account.
    ///
    /// Credentials that break the format rules are refused locally with
    /// `IncorrectInput`; nothing is sent.
    pub async fn sign_up(&mut self, login: &str, password: &str) -> Result<Response> {
        if let Err(e) = validate_credentials(login, password) {
            tracing::debug!("not sending registration: {}", e);
            return Ok(Response::new(Status::IncorrectInput, BAD_CREDENTIAL_FORMAT));
        }
        self.call(&Request::register(login, password)).await
    }

    pub async fn check_aggregate_hash(&mut self, digest: &str) -> Result<Response> {
        self.call(&Request::check_aggregate_hash(digest)).await
    }

    /// Ask for every file the server has that `entries` does not, and
    /// write the files into `dir`.
    pub async fn request_update<I, N, D>(&mut self, entries: I, dir: &Path) -> Result<UpdateReport>
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        write_request(self.transport.secure(), &Request::get_update(entries)).await?;
        let summary = receive_files(&mut self.transport, dir).await?;
        let response = read_response(self.transport.secure(), self.max_frame_len).await?;

        Ok(UpdateReport {
            files: summary.files,
            bytes: summary.bytes,
            response,
        })
    }

    /// Bring `dir` up to date with the server.
    ///
    /// Creates `dir` if missing. Only files whose name and digest the
    /// server does not find locally are transferred.
    pub async fn update(&mut self, dir: &Path) -> Result<UpdateOutcome> {
        tokio::fs::create_dir_all(dir).await?;
        let local = scan_local(dir.to_path_buf()).await?;

        let check = self.check_aggregate_hash(local.aggregate_digest()).await?;
        if check.is_success() {
            return Ok(UpdateOutcome::UpToDate);
        }

        let entries: Vec<(String, String)> = local
            .pairs()
            .map(|(name, digest)| (name.to_string(), digest.to_string()))
            .collect();
        let report = self.request_update(entries, dir).await?;
        Ok(UpdateOutcome::Updated(report))
    }

    /// Give back the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

async fn scan_local(dir: PathBuf) -> io::Result<filesync_core::FileInventory> {
    tokio::task::spawn_blocking(move || scan_directory(&dir))
        .await
        .map_err(io::Error::other)?
}
