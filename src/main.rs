use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{info, warn};

use txadmit::api::{create_router, AppState};
use txadmit::config::Config;
use txadmit::contract::{ContractLoader, ContractWatcher};
use txadmit::fee::FeeSchedule;
use txadmit::interpreter::{Library, LIBRARY_VERSION};
use txadmit::observability::{init_tracing, MetricsRegistry};
use txadmit::validation::Validator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_tracing(&config.log_level, config.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        library_version = LIBRARY_VERSION,
        "Starting txadmit"
    );

    let library = Arc::new(Library::standard());
    let metrics = Arc::new(MetricsRegistry::new());

    // Load contracts and start watching for changes
    let loader = ContractLoader::new(config.contracts_path.to_string_lossy(), library.clone());
    let watcher = ContractWatcher::new(loader, config.contracts_reload_interval())
        .with_metrics(metrics.clone());
    let (registry_rx, reload_handle) = watcher.start();

    if registry_rx.borrow().is_empty() {
        warn!(
            path = %config.contracts_path.display(),
            "No contracts loaded; validation requests will be rejected"
        );
    }

    let state = Arc::new(AppState {
        registry_rx,
        validator: Validator::new(library, config.eval_limits()),
        fee_schedule: FeeSchedule::default(),
        metrics,
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        latency_budget_ms: config.latency_budget_ms,
        request_timeout: config.request_timeout(),
        max_concurrency: config.max_concurrency,
    });

    let app = create_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    if config.graceful_shutdown {
        // bound the drain once the signal arrives
        let signalled = Arc::new(Notify::new());
        let notify = signalled.clone();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            shutdown_signal().await;
            notify.notify_one();
        });

        let timeout = config.shutdown_timeout();
        let drain_deadline = async {
            signalled.notified().await;
            tokio::time::sleep(timeout).await;
        };

        tokio::select! {
            result = server.into_future() => result?,
            _ = drain_deadline => warn!(timeout_secs = timeout.as_secs(), "Graceful shutdown timed out"),
        }
    } else {
        axum::serve(listener, app).await?;
    }

    info!("Shutting down...");
    reload_handle.abort();

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
