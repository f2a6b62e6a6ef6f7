//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use domain::{Money, Product};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::TxStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
}

impl ProductResponse {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            price_cents: product.price.cents(),
            stock: product.stock,
        }
    }
}

/// GET /products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let mut products = state
        .store
        .read(|docs| {
            docs.products()
                .map(ProductResponse::from_product)
                .collect::<Vec<_>>()
        })
        .await?;
    products.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(Json(products))
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: u32,
}

/// POST /products — add or replace a catalog entry (admin only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let user = state.auth.authenticate(&headers)?;
    user.require_admin()?;

    if req.price_cents < 0 {
        return Err(ApiError::BadRequest("price must not be negative".to_string()));
    }
    if req.id.trim().is_empty() {
        return Err(ApiError::BadRequest("product id must not be empty".to_string()));
    }

    let mut product = Product::new(
        req.id.as_str(),
        req.name.as_str(),
        Money::from_cents(req.price_cents),
        req.stock,
    );
    product.description = req.description;

    let response = state
        .store
        .transaction::<_, store::StoreError, _>(move |docs| {
            docs.put_product(product.clone());
            Ok(ProductResponse::from_product(&product))
        })
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
