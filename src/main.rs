//! Todo CRUD service.
//!
//! Startup order: environment file, configuration, logging, metrics, the
//! document store, then the listener. Ctrl+C or SIGTERM drains in-flight
//! requests before exit.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use todo_service::config::{load_config, StoreBackend};
use todo_service::lifecycle::{wait_for_signal, Shutdown};
use todo_service::observability::{logging, metrics};
use todo_service::store::{MemoryTodoStore, MongoTodoStore, TodoStore};
use todo_service::todos::TodoGateway;
use todo_service::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "todo-service", version, about = "Todo CRUD REST service")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "TODO_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.server.environment,
        "todo-service starting"
    );
    tracing::info!(
        bind_address = %config.bind_address(),
        backend = ?config.database.backend,
        rate_limit_max = config.rate_limit.max_requests,
        rate_limit_window_ms = config.rate_limit.window_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store: Arc<dyn TodoStore> = match config.database.backend {
        StoreBackend::Mongo => Arc::new(MongoTodoStore::connect(&config.database).await?),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryTodoStore::new())
        }
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        on_signal.trigger();
    });

    let server = HttpServer::new(config, TodoGateway::new(store));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
