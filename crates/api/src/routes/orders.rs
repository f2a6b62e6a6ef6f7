//! Order history endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::Order;
use gateway::PaymentGateway;
use serde::Serialize;
use store::TxStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub payment_status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
    pub payment_completed_at: Option<String>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl OrderResponse {
    fn from_order(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            status: order.status.as_str().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            total_cents: order.total.cents(),
            items: order
                .items
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                })
                .collect(),
            created_at: order.created_at.to_rfc3339(),
            payment_completed_at: order.payment_completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// GET /api/orders — the caller's order history, newest first.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let user = state.auth.authenticate(&headers)?;

    let orders = state
        .store
        .read(move |docs| {
            docs.orders_for_user(user.user_id)
                .into_iter()
                .map(OrderResponse::from_order)
                .collect::<Vec<_>>()
        })
        .await?;

    Ok(Json(orders))
}
