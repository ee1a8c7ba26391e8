// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `syncd`: the sync daemon binary. Loads configuration, replays state,
//! binds the IPC socket, and runs until told to stop.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use sync_adapters::{DesktopNotifyAdapter, FilesystemDriver};
use sync_core::SystemClock;
use sync_daemon::{lifecycle, socket};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let sync_config = load_sync_config()?;
    let config = lifecycle::Config::load(sync_config.clone())?;

    init_tracing(&config.log_path)?;

    tracing::info!(
        sync_root = %sync_config.sync_root.display(),
        remote_root = %sync_config.remote_root,
        poll_interval_secs = sync_config.poll_interval_secs,
        "starting sync daemon"
    );

    let driver = Arc::new(FilesystemDriver::new(sync_config.remote_root.clone()));
    let notifier = DesktopNotifyAdapter::new();

    let startup = lifecycle::startup(config, driver, SystemClock, notifier)
        .await
        .context("daemon startup failed")?;
    let daemon = startup.daemon;

    if startup.has_unfinished_items {
        tracing::info!("resuming items left pending/downloading by a prior, unfinished run");
        tokio::spawn(lifecycle::resume_unfinished(Arc::clone(&daemon)));
    }

    let poll_daemon = Arc::clone(&daemon);
    let poll_task = tokio::spawn(lifecycle::run_poll_loop(poll_daemon));

    let serve_daemon = Arc::clone(&daemon);
    let serve_task = tokio::spawn(socket::serve(startup.listener, serve_daemon));

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received");
    daemon.shutting_down.store(true, std::sync::atomic::Ordering::SeqCst);

    poll_task.abort();
    serve_task.abort();
    daemon.shutdown().context("daemon shutdown failed")?;

    Ok(())
}

/// `sync_root`/`remote_root` come from the config file at
/// `$XDG_CONFIG_HOME/sync/config.toml` (falling back to `~/.config/sync`),
/// overridable by environment for quick local testing.
fn load_sync_config() -> Result<sync_core::Config> {
    if let Ok(path) = std::env::var("SYNC_CONFIG_PATH") {
        return sync_core::Config::load_from(&PathBuf::from(path)).context("failed to load SYNC_CONFIG_PATH");
    }

    let config_dir = dirs::config_dir().map(|d| d.join("sync")).context("could not determine config directory")?;
    let config_path = config_dir.join("config.toml");
    sync_core::Config::load_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))
}

fn init_tracing(log_path: &std::path::Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Leaked deliberately: the guard must outlive `main` to flush on exit,
    // and the daemon process has no later point to drop it explicitly.
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .init();

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
