//! stackforged — the StackForge daemon.
//!
//! Single binary that assembles the control plane:
//! - Cluster store (redb)
//! - Dispatcher with the four reconcilers registered
//! - Portal (deploy form + JSON API)
//!
//! # Usage
//!
//! ```text
//! stackforged standalone --port 8080 --data-dir /var/lib/stackforge
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use stackforge_chaos::ChaosReconciler;
use stackforge_portal::PortalState;
use stackforge_reconcile::{
    BackendReconciler, DatabaseReconciler, Dispatcher, FrontendReconciler, ReconcilerConfig,
};

#[derive(Parser)]
#[command(name = "stackforged", about = "StackForge daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run in standalone mode (store, dispatcher, and portal in one process).
    Standalone {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Data directory for persistent state.
        #[arg(long, default_value = "/var/lib/stackforge")]
        data_dir: PathBuf,

        /// Namespace portal-created resources land in.
        #[arg(long, default_value = "default")]
        namespace: String,

        /// Seconds to wait before redelivering a suspended reconcile pass.
        #[arg(long, default_value = "5")]
        requeue_delay_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stackforged=debug,stackforge=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone {
            port,
            data_dir,
            namespace,
            requeue_delay_secs,
        } => run_standalone(port, data_dir, namespace, requeue_delay_secs).await,
    }
}

async fn run_standalone(
    port: u16,
    data_dir: PathBuf,
    namespace: String,
    requeue_delay_secs: u64,
) -> anyhow::Result<()> {
    info!("StackForge daemon starting in standalone mode");

    // Ensure data directory exists.
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join("stackforge.redb");

    // ── Initialize subsystems ──────────────────────────────────

    let store = stackforge_cluster::ClusterStore::open(&db_path)?;
    info!(path = ?db_path, "cluster store opened");

    let config = ReconcilerConfig::with_requeue_delay(Duration::from_secs(requeue_delay_secs));
    let mut dispatcher = Dispatcher::new(store.clone());
    dispatcher.register(Arc::new(DatabaseReconciler::new(config.clone())));
    dispatcher.register(Arc::new(BackendReconciler::new(config.clone())));
    dispatcher.register(Arc::new(FrontendReconciler::new(config.clone())));
    dispatcher.register(Arc::new(ChaosReconciler::new(config)));
    let dispatch = dispatcher.handle();
    info!(requeue_delay_secs, "dispatcher initialized");

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start the dispatch loop ────────────────────────────────

    let dispatch_handle = tokio::spawn(dispatcher.run(shutdown_rx));

    // ── Start the portal ───────────────────────────────────────

    let router = stackforge_portal::build_router(PortalState {
        store,
        dispatch,
        namespace,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "portal starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install CTRL+C handler");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for the dispatch loop to drain.
    let _ = dispatch_handle.await;

    info!("StackForge daemon stopped");
    Ok(())
}
