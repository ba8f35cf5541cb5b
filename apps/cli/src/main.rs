//! Dropshare terminal client.
//!
//! Uploads one file, prints the share link and then the download count as it
//! changes. Ctrl-C ends the session.

mod config;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use dropshare_session::{
    ChannelObserver, FileRef, ObserverEvent, SessionConfig, TransferSession, share_url,
};

use crate::config::{ClientConfig, ORIGIN_ENV};

#[derive(Parser)]
#[command(name = "dropshare", version, about = "Upload a file and share it by code")]
struct Cli {
    /// File to upload
    file: PathBuf,

    /// Server origin, e.g. https://drop.example.com
    #[arg(short, long)]
    origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let file_config = match ClientConfig::load() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            ClientConfig::default()
        }
    };
    let origin = file_config.resolve_origin(cli.origin, std::env::var(ORIGIN_ENV).ok());
    let session_config = SessionConfig::from_origin(&origin)?;

    let file = FileRef::from_path(&cli.file)
        .with_context(|| format!("cannot upload {}", cli.file.display()))?;
    tracing::info!(
        file = file.name(),
        size = file.size(),
        endpoint = %session_config.endpoint,
        "starting upload"
    );

    let (observer, mut events) = ChannelObserver::channel();
    let session = TransferSession::new(session_config, Arc::new(observer));
    session.start(file)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                println!();
                break Ok(());
            }
            event = events.recv() => match event {
                Some(ObserverEvent::Progress(percent)) => {
                    print!("\ruploading... {percent:>3}%");
                    let _ = std::io::stdout().flush();
                }
                Some(ObserverEvent::Link(code)) => {
                    println!("\nshare link: {}", share_url(&origin, &code));
                    println!("press Ctrl-C to stop sharing");
                }
                Some(ObserverEvent::Stats(downloads)) => println!("downloads: {downloads}"),
                Some(ObserverEvent::Error { kind, message }) => {
                    println!();
                    break Err(anyhow!("{message} ({kind})"));
                }
                Some(ObserverEvent::StateChanged(state)) => {
                    tracing::debug!(%state, "session state changed");
                }
                None => break Ok(()),
            },
        }
    };

    session.clear().await;
    tracing::info!(state = %session.state(), "session ended");
    outcome
}
