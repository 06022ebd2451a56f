use clap::Parser;
use discovery::{MemoryStore, NamespaceStore, TokenManager};
use discovery_server::config::{CliArgs, ServerConfig, StoreKind};
use discovery_server::http::{AppState, router};
use discovery_server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    let res = match config.store {
        StoreKind::Memory => {
            tracing::warn!("using in-memory store; tokens will not survive a restart");
            run_server(MemoryStore::new(), config).await
        }
        StoreKind::Etcd => {
            #[cfg(feature = "etcd")]
            {
                let store =
                    discovery::EtcdStore::connect(&config.etcd_endpoints, config.etcd_timeout)
                        .await?;
                run_server(store, config).await
            }
            #[cfg(not(feature = "etcd"))]
            {
                Err(anyhow::anyhow!(
                    "STORE=etcd requires building with the `etcd` feature"
                ))
            }
        }
    };

    providers.shutdown();
    res
}

async fn run_server<S>(store: S, config: ServerConfig) -> anyhow::Result<()>
where
    S: NamespaceStore + 'static,
{
    let manager = TokenManager::new(store)
        .with_root(&config.registry_root)?
        .with_rollback(config.rollback_partial_setup);
    let state = AppState::new(manager, config.discovery_url.clone(), config.default_size);
    let app = router(state, config.allow_teardown);

    let listener = TcpListener::bind(&config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting discovery service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting discovery service on {} (store: {:?}, base: {})",
            config.server_addr,
            config.store,
            config.discovery_url.base()
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
