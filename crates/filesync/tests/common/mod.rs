//! Loopback server harness shared by the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use filesync::{connect_plain, Client, Server, ServerConfig};
use filesync::protocol::Plain;
use tokio::net::TcpStream;

/// A server running on an ephemeral loopback port.
pub struct Running {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<filesync::Result<()>>,
}

impl Running {
    pub async fn start(config: ServerConfig) -> Self {
        let server = Server::open(config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, rx) = oneshot::channel::<()>();
        let shutdown = async move {
            let _ = rx.await;
        };
        let task = tokio::spawn(async move { server.run_on(listener, shutdown).await });

        Self {
            addr,
            stop: Some(stop),
            task,
        }
    }

    /// Serve `dir` over plain TCP with in-memory credentials.
    pub async fn plain(dir: &Path) -> Self {
        Self::start(config(dir)).await
    }

    pub async fn client(&self) -> Client<Plain<TcpStream>> {
        Client::new(connect_plain(self.addr).await.unwrap())
    }

    /// Stop accepting and wait for the accept loop to return.
    pub async fn stop(mut self) -> filesync::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.task.await.unwrap()
    }
}

pub fn config(dir: &Path) -> ServerConfig {
    ServerConfig {
        data_dir: dir.to_path_buf(),
        ..ServerConfig::default()
    }
}
