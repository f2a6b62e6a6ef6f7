//! Checkout submission endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use checkout::{CartLine, CustomerDetails};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::TxStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItemRequest>,
    pub customer: CustomerRequest,
}

/// One cart line. Prices are never accepted from the client.
#[derive(Deserialize)]
pub struct CheckoutItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub payment_id: String,
    pub correlation_id: String,
    pub message: String,
}

/// POST /api/checkout — reserve stock and initiate the M-Pesa payment.
#[tracing::instrument(skip(state, headers, req))]
pub async fn submit<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let user = state.auth.authenticate(&headers)?;

    let cart: Vec<CartLine> = req
        .items
        .into_iter()
        .map(|item| CartLine {
            product_id: item.product_id.into(),
            quantity: item.quantity,
        })
        .collect();
    let customer = CustomerDetails {
        name: req.customer.name,
        email: req.customer.email,
        phone_number: req.customer.phone_number,
    };

    let receipt = state
        .orchestrator
        .checkout(user.user_id, cart, customer)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: receipt.order_id.to_string(),
            payment_id: receipt.payment_id.to_string(),
            correlation_id: receipt.correlation_id.to_string(),
            message: receipt.message,
        }),
    ))
}
