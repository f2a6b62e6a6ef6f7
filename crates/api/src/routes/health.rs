//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use gateway::PaymentGateway;
use serde::Serialize;
use store::TxStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Number of catalog entries; proves the store answers reads.
    pub catalog_size: usize,
}

/// GET /health — process and store liveness.
pub async fn check<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<HealthResponse>, ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let catalog_size = state.store.read(|docs| docs.products().count()).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        catalog_size,
    }))
}
