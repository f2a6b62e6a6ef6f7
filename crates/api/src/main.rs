//! API server entry point.

use std::sync::Arc;
use std::time::Duration;

use checkout::ReservationSweeper;
use domain::{Money, Product};
use gateway::HttpGateway;
use store::{MemoryStore, StoreError, TxStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::auth::AuthConfig;
use api::config::Config;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Seeds a small starter catalog so a fresh instance is usable.
async fn seed_catalog(store: &MemoryStore) {
    store
        .transaction::<_, StoreError, _>(|docs| {
            if docs.products().next().is_none() {
                docs.put_product(Product::new(
                    "SKU-STICK",
                    "Carbon Hockey Stick",
                    Money::from_units(12_000),
                    25,
                ));
                docs.put_product(Product::new(
                    "SKU-PUCK",
                    "Game Puck",
                    Money::from_units(500),
                    200,
                ));
                docs.put_product(Product::new(
                    "SKU-JERSEY",
                    "Team Jersey",
                    Money::from_units(4_500),
                    60,
                ));
            }
            Ok(())
        })
        .await
        .expect("failed to seed catalog");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create the store, gateway client, and application state
    let store = MemoryStore::new();
    seed_catalog(&store).await;

    let gateway = HttpGateway::new(config.gateway());
    let auth = AuthConfig::new(&config.jwt_secret);
    let state = Arc::new(api::AppState::new(store.clone(), gateway, auth));

    // 4. Spawn the reservation sweep
    let sweeper = ReservationSweeper::new(
        store,
        Duration::from_secs(config.reservation_ttl_secs),
    );
    tokio::spawn(sweeper.run(Duration::from_secs(config.sweep_interval_secs)));

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
