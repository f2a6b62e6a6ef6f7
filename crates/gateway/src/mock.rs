//! Scripted gateway for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::CorrelationId;

use crate::client::{AccessToken, PaymentGateway};
use crate::error::GatewayError;
use crate::types::{InitiateRequest, StkInitiation};

#[derive(Debug, Default)]
struct MockState {
    fail_authorize: bool,
    unreachable: bool,
    response_code: Option<String>,
    description: Option<String>,
    next_id: u32,
    initiations: Vec<InitiateRequest>,
}

/// In-memory gateway that scripts outcomes and records calls.
///
/// Accepts every initiation by default; individual failure modes are
/// switched on per test.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<MockState>>,
}

impl MockGateway {
    /// Creates a gateway that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next credential exchange fail.
    pub fn set_fail_authorize(&self, fail: bool) {
        self.state.lock().unwrap().fail_authorize = fail;
    }

    /// Makes the next initiation fail at the transport level.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    /// Makes the gateway reject initiations with the given code/description.
    pub fn set_rejection(&self, code: impl Into<String>, description: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.response_code = Some(code.into());
        state.description = Some(description.into());
    }

    /// Returns how many initiation requests were received.
    pub fn initiation_count(&self) -> usize {
        self.state.lock().unwrap().initiations.len()
    }

    /// Returns the most recent initiation request, if any.
    pub fn last_initiation(&self) -> Option<InitiateRequest> {
        self.state.lock().unwrap().initiations.last().cloned()
    }

    /// Returns the correlation id that was assigned most recently.
    pub fn last_correlation_id(&self) -> Option<CorrelationId> {
        let state = self.state.lock().unwrap();
        if state.next_id == 0 {
            None
        } else {
            Some(CorrelationId::new(format!(
                "ws_CO_MOCK_{:04}",
                state.next_id
            )))
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn authorize(&self) -> Result<AccessToken, GatewayError> {
        if self.state.lock().unwrap().fail_authorize {
            return Err(GatewayError::AuthFailed(401));
        }
        Ok(AccessToken::new("mock-access-token"))
    }

    async fn initiate(
        &self,
        _token: &AccessToken,
        request: InitiateRequest,
    ) -> Result<StkInitiation, GatewayError> {
        let mut state = self.state.lock().unwrap();

        if state.unreachable {
            return Err(GatewayError::Unreachable("connection refused".to_string()));
        }

        state.initiations.push(request);
        state.next_id += 1;
        let correlation_id = format!("ws_CO_MOCK_{:04}", state.next_id);
        let response_code = state.response_code.clone().unwrap_or_else(|| "0".to_string());
        let description = state
            .description
            .clone()
            .unwrap_or_else(|| "Success. Request accepted for processing".to_string());

        let raw = serde_json::json!({
            "ResponseCode": response_code,
            "CheckoutRequestID": correlation_id,
            "ResponseDescription": description,
        });
        Ok(StkInitiation::from_body(raw))
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, PhoneNumber};

    use super::*;

    fn request() -> InitiateRequest {
        InitiateRequest {
            amount: Money::from_units(100),
            phone: PhoneNumber::parse("254712345678").unwrap(),
            account_reference: "ORDER_test".to_string(),
            description: "Payment for order".to_string(),
        }
    }

    #[tokio::test]
    async fn test_accepts_by_default() {
        let gateway = MockGateway::new();
        let token = gateway.authorize().await.unwrap();
        let initiation = gateway.initiate(&token, request()).await.unwrap();
        assert!(initiation.accepted().is_some());
        assert_eq!(gateway.initiation_count(), 1);
        assert_eq!(
            initiation.accepted(),
            gateway.last_correlation_id().as_ref()
        );
    }

    #[tokio::test]
    async fn test_scripted_rejection() {
        let gateway = MockGateway::new();
        gateway.set_rejection("1", "Insufficient funds");
        let token = gateway.authorize().await.unwrap();
        let initiation = gateway.initiate(&token, request()).await.unwrap();
        assert!(initiation.accepted().is_none());
        assert_eq!(initiation.description, "Insufficient funds");
    }

    #[tokio::test]
    async fn test_scripted_transport_failure() {
        let gateway = MockGateway::new();
        gateway.set_unreachable(true);
        let token = gateway.authorize().await.unwrap();
        let err = gateway.initiate(&token, request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unreachable(_)));
        assert_eq!(gateway.initiation_count(), 0);
    }

    #[tokio::test]
    async fn test_scripted_auth_failure() {
        let gateway = MockGateway::new();
        gateway.set_fail_authorize(true);
        let err = gateway.authorize().await.unwrap_err();
        assert!(matches!(err, GatewayError::AuthFailed(401)));
    }
}
