//! filesync server
//!
//! Publishes a directory to signed-in clients.
//!
//! Usage:
//!   filesync-server serve --dir data --db users.db --cert server.crt --key server.key
//!   filesync-server passwd alice NewSecret_1 --db users.db

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filesync::core::{validate_password, PasswordDigest};
use filesync::store::{CredentialStore, SqliteCredentials};
use filesync::{CredentialsConfig, Server, ServerConfig, TlsConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filesync-server")]
#[command(about = "Serve a directory to filesync clients")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the managed directory
    Serve {
        /// Managed directory (created if missing)
        #[arg(long, default_value = "data")]
        dir: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:3333")]
        bind: SocketAddr,

        /// SQLite credential database; in-memory when omitted
        #[arg(long)]
        db: Option<PathBuf>,

        /// PEM certificate chain
        #[arg(long, requires = "key")]
        cert: Option<PathBuf>,

        /// PEM private key
        #[arg(long, requires = "cert")]
        key: Option<PathBuf>,

        /// Worker threads (defaults to available parallelism)
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Reset the password of an existing account
    Passwd {
        login: String,
        password: String,

        /// SQLite credential database
        #[arg(long)]
        db: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Serve {
            dir,
            bind,
            db,
            cert,
            key,
            workers,
        } => {
            let mut config = ServerConfig {
                bind_addr: bind,
                data_dir: dir,
                credentials: db.map_or(CredentialsConfig::Memory, CredentialsConfig::Sqlite),
                tls: cert.zip(key).map(|(cert_chain, private_key)| TlsConfig {
                    cert_chain,
                    private_key,
                }),
                ..ServerConfig::default()
            };
            if let Some(workers) = workers {
                config.worker_threads = workers;
            }
            serve(config)
        }
        Command::Passwd {
            login,
            password,
            db,
        } => {
            validate_password(&password)?;
            let config = ServerConfig {
                worker_threads: 1,
                ..ServerConfig::default()
            };
            let runtime = config.runtime().context("failed to start runtime")?;
            runtime.block_on(async {
                let credentials = SqliteCredentials::open(&db)
                    .with_context(|| format!("failed to open {}", db.display()))?;
                credentials
                    .update_credential(&login, &PasswordDigest::derive(&password))
                    .await
                    .with_context(|| format!("failed to update {}", login))?;
                info!("password for {} updated", login);
                Ok::<_, anyhow::Error>(())
            })
        }
    }
}

fn serve(config: ServerConfig) -> Result<()> {
    let runtime = config.runtime().context("failed to start runtime")?;
    info!(
        "filesync-server starting with {} workers on {}",
        config.worker_threads, config.bind_addr
    );

    runtime.block_on(async move {
        let server = Server::open(config).context("failed to open server")?;
        server
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!("cannot listen for ctrl-c: {}", e);
                    std::future::pending::<()>().await;
                }
            })
            .await?;
        info!("filesync-server stopped");
        Ok::<_, anyhow::Error>(())
    })
}
