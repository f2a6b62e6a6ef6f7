//! Gateway error types.

use thiserror::Error;

/// Errors that can occur when talking to the payment gateway.
///
/// A business-level rejection (non-zero response code) is not an error —
/// it is carried on [`crate::StkInitiation`] for the caller to act on.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The credential exchange was refused.
    #[error("credential exchange failed with HTTP status {0}")]
    AuthFailed(u16),

    /// The gateway could not be reached at the transport level.
    #[error("gateway unreachable: {0}")]
    Unreachable(String),

    /// The gateway answered with a body the client cannot interpret.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}
