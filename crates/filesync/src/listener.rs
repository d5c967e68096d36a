//! Accept loop.
//!
//! Every accepted socket is upgraded and handed to its own task running
//! a [`Session`]. A failing session is logged and dropped; it never
//! reaches the accept loop.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;

use filesync_protocol::{Plain, Session, SessionConfig, Transport};
use filesync_store::{CredentialStore, Inventory};

/// Turns an accepted socket into a session transport.
#[async_trait]
pub trait Upgrade: Send + Sync + 'static {
    type Stream: Transport + 'static;

    async fn upgrade(&self, stream: TcpStream) -> io::Result<Self::Stream>;
}

/// No handshake: the socket serves as both channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainUpgrade;

#[async_trait]
impl Upgrade for PlainUpgrade {
    type Stream = Plain<TcpStream>;

    async fn upgrade(&self, stream: TcpStream) -> io::Result<Self::Stream> {
        Ok(Plain::new(stream))
    }
}

/// Shared state handed to every session.
pub struct Shared<C> {
    pub credentials: C,
    pub inventory: Arc<Inventory>,
    pub session: SessionConfig,
}

/// Accept connections until `shutdown` resolves.
///
/// Sessions already running are left to finish on their own.
pub async fn serve<U, C, F>(
    listener: TcpListener,
    upgrade: Arc<U>,
    shared: Arc<Shared<C>>,
    shutdown: F,
) -> io::Result<()>
where
    U: Upgrade,
    C: CredentialStore + Clone + 'static,
    F: Future<Output = ()>,
{
    let local = listener.local_addr()?;
    tracing::info!("listening on {}", local);
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("listener on {} stopped", local);
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            },
        };

        let upgrade = upgrade.clone();
        let shared = shared.clone();
        tokio::spawn(async move {
            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("set_nodelay for {}: {}", peer, e);
            }
            let transport = match upgrade.upgrade(stream).await {
                Ok(transport) => transport,
                Err(e) => {
                    tracing::warn!("handshake with {} failed: {}", peer, e);
                    return;
                }
            };

            let session = Session::new(
                transport,
                shared.credentials.clone(),
                shared.inventory.clone(),
                shared.session.clone(),
            );
            let span = tracing::info_span!("session", id = session.id(), %peer);

            async move {
                tracing::debug!("session started");
                match session.run().await {
                    Ok(()) => tracing::debug!("session closed"),
                    Err(e) if e.is_disconnect() => tracing::debug!("session dropped: {}", e),
                    Err(e) => tracing::warn!("session failed: {}", e),
                }
            }
            .instrument(span)
            .await;
        });
    }
}
