//! The gateway client trait and its HTTP implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::credentials::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{InitiateRequest, StkInitiation, StkPushRequest};

/// A short-lived bearer credential from the gateway's OAuth exchange.
#[derive(Debug, Clone)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trait for payment gateway operations.
///
/// The remote service is treated as unreliable and the client performs no
/// automatic retry — the contract is one authorize and one initiate per
/// checkout attempt; retrying is the caller's decision.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Exchanges the configured consumer credentials for a bearer token.
    async fn authorize(&self) -> Result<AccessToken, GatewayError>;

    /// Submits a payment-initiation request.
    ///
    /// Transport problems are errors; a business-level rejection comes
    /// back as a [`StkInitiation`] whose response code is non-zero.
    async fn initiate(
        &self,
        token: &AccessToken,
        request: InitiateRequest,
    ) -> Result<StkInitiation, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Gateway client over HTTPS (Daraja sandbox or production).
pub struct HttpGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Creates a client for the configured environment.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn auth_url(&self) -> String {
        format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.config.environment.base_url()
        )
    }

    fn stk_push_url(&self) -> String {
        format!(
            "{}/mpesa/stkpush/v1/processrequest",
            self.config.environment.base_url()
        )
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    #[tracing::instrument(skip(self))]
    async fn authorize(&self) -> Result<AccessToken, GatewayError> {
        let response = self
            .http
            .get(self.auth_url())
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::AuthFailed(response.status().as_u16()));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(AccessToken::new(body.access_token))
    }

    #[tracing::instrument(skip(self, token, request), fields(account_reference = %request.account_reference))]
    async fn initiate(
        &self,
        token: &AccessToken,
        request: InitiateRequest,
    ) -> Result<StkInitiation, GatewayError> {
        let wire = StkPushRequest::build(&self.config, &request, Utc::now());
        let response = self
            .http
            .post(self.stk_push_url())
            .bearer_auth(token.as_str())
            .json(&wire)
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;

        let status = response.status();
        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(GatewayError::InvalidResponse(format!(
                "HTTP {status}: {raw}"
            )));
        }

        tracing::debug!(code = %raw["ResponseCode"], "initiation response received");
        Ok(StkInitiation::from_body(raw))
    }
}
