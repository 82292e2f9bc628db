//! Engine error types with HTTP status code mapping.
//!
//! [`EngineError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Money;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "insufficient funds: required 300, available 100",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`EngineError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category                | HTTP Status                |
/// |-----------|-------------------------|----------------------------|
/// | 1000–1999 | Validation              | 400 Bad Request            |
/// | 2000–2999 | Not Found / Ownership   | 403 / 404                  |
/// | 3000–3999 | Server / Reconciliation | 500 Internal Server Error  |
/// | 4000–4999 | Ledger                  | 422 Unprocessable Entity   |
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Wallet has less spendable balance than the operation requires.
    /// The calling operation aborts with no partial state change.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Amount the operation needed.
        required: Money,
        /// Spendable balance at the time of the attempt.
        available: Money,
    },

    /// Monitor with the given id was not found.
    #[error("monitor not found: {0}")]
    MonitorNotFound(uuid::Uuid),

    /// No wallet exists for the given user.
    #[error("wallet not found for user {0}")]
    WalletNotFound(uuid::Uuid),

    /// A user attempted to act on another user's monitor.
    #[error("monitor {0} is not owned by the requesting user")]
    Forbidden(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A defensive settlement check failed: the ledger state does not
    /// match the reservation bookkeeping. Logged as an operational alert
    /// and escalated to manual reconciliation, never surfaced as a
    /// successful purchase.
    #[error("settlement inconsistency: {0}")]
    SettlementInconsistency(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::MonitorNotFound(_) => 2001,
            Self::WalletNotFound(_) => 2002,
            Self::Forbidden(_) => 2003,
            Self::InsufficientFunds { .. } => 4001,
            Self::SettlementInconsistency(_) => 3002,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MonitorNotFound(_) | Self::WalletNotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SettlementInconsistency(_) | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
