//! HTTP API server for the store backend.
//!
//! Exposes checkout submission, payment status, the gateway callback
//! webhook, order history, and the catalog, with structured logging
//! (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{CallbackReconciler, CheckoutOrchestrator};
use gateway::PaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::TxStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

/// Shared application state accessible from all handlers.
pub struct AppState<S: TxStore, G> {
    pub store: S,
    pub orchestrator: CheckoutOrchestrator<S, G>,
    pub reconciler: CallbackReconciler<S>,
    pub auth: AuthConfig,
}

impl<S, G> AppState<S, G>
where
    S: TxStore + Clone,
    G: PaymentGateway,
{
    /// Wires the workflow services over one store and gateway.
    pub fn new(store: S, gateway: G, auth: AuthConfig) -> Self {
        Self {
            orchestrator: CheckoutOrchestrator::new(store.clone(), gateway),
            reconciler: CallbackReconciler::new(store.clone()),
            store,
            auth,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, G>))
        .route("/api/checkout", post(routes::checkout::submit::<S, G>))
        .route("/api/payments/{id}", get(routes::payments::status::<S, G>))
        .route(
            "/api/payments/callback",
            post(routes::payments::callback::<S, G>),
        )
        .route("/api/orders", get(routes::orders::list::<S, G>))
        .route("/products", get(routes::products::list::<S, G>))
        .route("/products", post(routes::products::create::<S, G>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
