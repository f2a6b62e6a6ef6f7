//! Payment status and gateway callback endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use domain::{OrderId, Payment, PaymentId};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::TxStore;

use crate::AppState;
use crate::auth::Role;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub order_id: uuid::Uuid,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub status: String,
    pub amount_cents: i64,
    pub method: String,
    pub correlation_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PaymentResponse {
    fn from_payment(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            status: payment.status.as_str().to_string(),
            amount_cents: payment.amount.cents(),
            method: payment.method.as_str().to_string(),
            correlation_id: payment.correlation_id.as_ref().map(|c| c.to_string()),
            created_at: payment.created_at.to_rfc3339(),
            updated_at: payment.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/payments/:id?order_id= — current payment status.
///
/// The order id must match and the order must belong to the caller
/// (admins may read any payment).
#[tracing::instrument(skip(state, headers))]
pub async fn status<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<PaymentResponse>, ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    let user = state.auth.authenticate(&headers)?;
    let payment_id = PaymentId::from_uuid(id);
    let order_id = OrderId::from_uuid(query.order_id);

    let response = state
        .store
        .read(move |docs| {
            let payment = docs.payment(&payment_id)?;
            if payment.order_id != order_id {
                return None;
            }
            let order = docs.order(&order_id)?;
            if user.role != Role::Admin && order.user_id != user.user_id {
                return None;
            }
            Some(PaymentResponse::from_payment(payment))
        })
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Payment {id} not found")))?;

    Ok(Json(response))
}

#[derive(Serialize)]
pub struct CallbackAck {
    pub success: bool,
}

/// POST /api/payments/callback — gateway outcome notification.
///
/// Unauthenticated: the gateway does not sign deliveries. Duplicate
/// notifications are acknowledged without reprocessing.
#[tracing::instrument(skip(state, payload))]
pub async fn callback<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<CallbackAck>, ApiError>
where
    S: TxStore + 'static,
    G: PaymentGateway + 'static,
{
    state.reconciler.reconcile(payload).await?;
    Ok(Json(CallbackAck { success: true }))
}
