//! # roomchat
//!
//! Terminal chat client for room-based chat servers.
//!
//! ## Usage
//!
//! ```bash
//! # Connect to a local server on localhost:8080
//! roomchat
//!
//! # Connect to the hosted server
//! roomchat --server render
//!
//! # Connect to a custom address, skipping the identity prompt
//! roomchat --addr example.com:8080 --name Bob --room lobby
//!
//! # Run with environment variables
//! ROOMCHAT_ADDR=10.0.0.5:8080 RUST_LOG=roomchat=debug roomchat
//! ```

mod cli;
mod config;
mod error;
mod prompt;
mod tui;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use roomchat_core::{DuplexPump, Identity, QueueSink, Router, Shutdown, ShutdownReason};
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ClientError;
use crate::tui::{TerminalGuard, UiChannels};
use crate::view::ChatView;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(reason) => {
            if reason.is_transport_failure() {
                eprintln!("Connection lost: {reason}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Client failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ShutdownReason> {
    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(&config)?;

    let identity = collect_identity(&cli).await?;
    let endpoint = config.endpoint();

    let connection = roomchat_transport::connect(&endpoint, &config.websocket())
        .await
        .map_err(ClientError::from)?;

    info!("Connected to room {}", identity.room());
    info!("Press ctrl^c to close application");

    let mut view = ChatView::new();
    view.push_info(format!("Connected to room {}", identity.room()));
    view.push_info("Press ctrl^c to close application");

    let shutdown = Shutdown::new();
    let (pump, handles) = DuplexPump::start(Box::new(connection), shutdown.clone());

    let (sink, displayed) = QueueSink::channel();
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    let (quit_tx, quit_rx) = oneshot::channel();

    let router = Router::new(identity, sink, handles, lines_rx, shutdown.clone())
        .with_interrupt(interrupted(quit_rx));
    let router = tokio::spawn(router.run());

    let channels = UiChannels {
        displayed,
        lines: lines_tx,
        quit: quit_tx,
    };
    let ui_result = match TerminalGuard::enter() {
        Ok(mut guard) => tui::run(&mut guard, view, channels, shutdown.clone()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = &ui_result {
        error!(error = %e, "Terminal UI failed");
        shutdown.trigger(ShutdownReason::UiClosed);
    }

    if let Err(e) = router.await {
        warn!(error = %e, "Router task did not exit cleanly");
    }
    let reason = pump.shutdown().await;
    info!(%reason, "Session ended");

    ui_result?;
    Ok(reason)
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log.file)
        .with_context(|| format!("Failed to open log file: {}", config.log.file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log.filter.as_str().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

/// Name and room from the flags, or from the prompt if either is missing.
async fn collect_identity(cli: &Cli) -> Result<Identity> {
    let (name, room) = match (&cli.name, &cli.room) {
        (Some(name), Some(room)) => (prompt::sanitize(name), prompt::sanitize(room)),
        _ => tokio::task::spawn_blocking(prompt::ask_identity)
            .await
            .context("Identity prompt panicked")??,
    };

    Ok(Identity::new(name, room))
}

/// Completes on Ctrl-C, SIGTERM, or a quit key in the UI.
async fn interrupted(quit: oneshot::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let quit_key = async {
        // A dropped sender means the UI exited, not that the user quit
        if quit.await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
        () = quit_key => {}
    }
}
