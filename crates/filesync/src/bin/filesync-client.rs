//! filesync client
//!
//! Usage:
//!   filesync-client --addr 127.0.0.1:3333 ping
//!   filesync-client --addr 127.0.0.1:3333 --ca ca.crt register alice Secret_1
//!   filesync-client --addr 127.0.0.1:3333 --ca ca.crt update alice Secret_1 --dir ./mirror

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use filesync::protocol::Transport;
use filesync::{connect_plain, connect_tls, load_root_store, Client, UpdateOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filesync-client")]
#[command(about = "Talk to a filesync server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:3333")]
    addr: String,

    /// PEM file with the CA that signed the server certificate; plain TCP when omitted
    #[arg(long)]
    ca: Option<PathBuf>,

    /// Name to verify in the server certificate
    #[arg(long, default_value = "localhost")]
    server_name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server answers
    Ping,

    /// Create an account
    Register { login: String, password: String },

    /// Sign in and download missing files
    Update {
        login: String,
        password: String,

        /// Local mirror directory
        #[arg(long, default_value = "data")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match &args.ca {
        Some(ca) => {
            let roots = load_root_store(ca)
                .with_context(|| format!("failed to load CA from {}", ca.display()))?;
            let stream = connect_tls(args.addr.as_str(), &args.server_name, roots)
                .await
                .with_context(|| format!("failed to connect to {}", args.addr))?;
            run(Client::new(stream), args.command).await
        }
        None => {
            let stream = connect_plain(args.addr.as_str())
                .await
                .with_context(|| format!("failed to connect to {}", args.addr))?;
            run(Client::new(stream), args.command).await
        }
    }
}

async fn run<T: Transport>(mut client: Client<T>, command: Command) -> Result<()> {
    match command {
        Command::Ping => {
            let response = client.ping().await?;
            info!("{}", response);
        }
        Command::Register { login, password } => {
            let response = client.sign_up(&login, &password).await?;
            if !response.is_success() {
                bail!("registration refused: {}", response);
            }
            info!("registered {}", login);
        }
        Command::Update {
            login,
            password,
            dir,
        } => {
            let response = client.sign_in(&login, &password).await?;
            if !response.is_success() {
                bail!("sign-in refused: {}", response);
            }
            match client.update(&dir).await? {
                UpdateOutcome::UpToDate => info!("{} is up to date", dir.display()),
                UpdateOutcome::Updated(report) => {
                    for name in &report.files {
                        info!("received {}", name);
                    }
                    info!(
                        "{} files, {} bytes: {}",
                        report.files.len(),
                        report.bytes,
                        report.response
                    );
                    if !report.response.is_success() {
                        bail!("update failed: {}", report.response);
                    }
                }
            }
        }
    }
    Ok(())
}
