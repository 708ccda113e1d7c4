use thiserror::Error;

use crate::domain::types::TypeConstraintError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport failure: DNS, connect, reset.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// 2xx response whose envelope reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    /// Required field missing or malformed, caught before sending.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation the backend does not support yet. Not a transient failure.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// Whether the caller should present the feature as unavailable.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, GatewayError::NotImplemented(_))
    }

    /// HTTP status when the backend answered with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            GatewayError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

impl From<TypeConstraintError> for GatewayError {
    fn from(err: TypeConstraintError) -> Self {
        GatewayError::Validation(err.to_string())
    }
}
