//! The `run` command: load configuration, initialize logging, wire up
//! every service, and block until a shutdown signal or control message
//! arrives.

use crate::backend::{self, http::HttpBackend, log::LogBackend, prometheus::PrometheusBackend, statsd::StatsdBackend, BackendTable};
use crate::cli::RunArgs;
use crate::config::{BackendConfig, LogFormat, OgreConfig};
use crate::control::ControlSocket;
use crate::docker::{Client, Watcher};
use crate::hub::RoutingHub;
use crate::pid::PidGuard;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration from disk (if present), apply env then CLI
/// overrides, and validate the result.
pub fn load_config(args: &RunArgs) -> anyhow::Result<OgreConfig> {
    let path = args.config.exists().then_some(args.config.as_path());
    let mut config = OgreConfig::load(path)?.with_env_overrides();

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(socket_path) = &args.socket_path {
        config.socket_path = socket_path.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Initialize the global `tracing` subscriber from the configured
/// format and level.
pub fn init_tracing(config: &crate::config::LoggingConfig) -> anyhow::Result<()> {
    let filter_str = crate::logging::build_filter_directives(config);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }
    Ok(())
}

/// Build the backend fan-out table from the configured sinks, spawning
/// any background task a sink needs (currently only Prometheus's scrape
/// server).
async fn build_backend_table(
    config: &[BackendConfig],
    token: &CancellationToken,
) -> anyhow::Result<(BackendTable, Vec<tokio::task::JoinHandle<()>>)> {
    let mut table = BackendTable::new(Arc::new(LogBackend));
    let mut handles = Vec::new();

    for entry in config {
        match entry {
            BackendConfig::Statsd { server, prefix } => {
                let addr = server.parse()?;
                let backend = StatsdBackend::connect(addr, prefix.clone()).await?;
                table.register(Arc::new(backend));
            }
            BackendConfig::Http { url } => {
                table.register(Arc::new(HttpBackend::new(url.clone())));
            }
            BackendConfig::Prometheus { bind } => {
                let addr = bind.parse()?;
                let backend = Arc::new(PrometheusBackend::new());
                table.register(Arc::clone(&backend) as Arc<dyn backend::Backend>);
                let scrape_token = token.clone();
                handles.push(tokio::spawn(async move {
                    if let Err(e) = crate::backend::prometheus::serve(addr, backend, scrape_token).await {
                        tracing::error!(error = %e, "prometheus scrape server stopped");
                    }
                }));
            }
        }
    }

    Ok((table, handles))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    init_tracing(&config.logging)?;
    tracing::info!(?config.socket_path, "starting ogre-healthd");

    if let Some(pid) = crate::pid::stale_owner(&config.pid_path) {
        anyhow::bail!(
            "refusing to start: pid file {} names running process {pid}",
            config.pid_path.display()
        );
    }
    let _pid_guard = PidGuard::acquire(&config.pid_path)?;

    let daemon_scope = CancellationToken::new();
    let docker_scope = daemon_scope.child_token();

    let docker_client = Arc::new(Client::connect()?);
    let (inbound_tx, inbound_rx) = mpsc::channel(256);
    let (backend_tx, backend_rx) = backend::inbox();
    let (watcher_control_tx, watcher_control_rx) = mpsc::channel(8);

    let hub = RoutingHub::new(
        inbound_rx,
        inbound_tx.clone(),
        backend_tx,
        watcher_control_tx,
        Arc::clone(&docker_client),
        docker_scope.clone(),
        daemon_scope.clone(),
    );

    let (backend_table, backend_server_handles) = build_backend_table(&config.backends, &daemon_scope).await?;
    let backend_handle = tokio::spawn(backend::run(backend_rx, backend_table, daemon_scope.clone()));

    let watcher = Arc::new(Watcher::new(Arc::clone(&docker_client), hub.inbound()));
    watcher.enumerate().await?;
    let watcher_handle = Arc::clone(&watcher).spawn(docker_scope.clone(), watcher_control_rx);

    let control_socket = ControlSocket::bind(&config.socket_path).await?;
    let control_handle = control_socket.spawn(hub.inbound(), daemon_scope.clone());

    let hub_handle = tokio::spawn(hub.run());

    tokio::select! {
        _ = shutdown_signal() => {
            daemon_scope.cancel();
        }
        _ = daemon_scope.cancelled() => {}
    }

    let _ = hub_handle.await;
    let _ = watcher_handle.await;
    let _ = control_handle.await;
    let _ = backend_handle.await;
    for handle in backend_server_handles {
        let _ = handle.await;
    }

    tracing::info!("ogre-healthd stopped");
    Ok(())
}
