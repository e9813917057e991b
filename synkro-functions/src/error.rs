//! Function error type
//!
//! Every failure is answered with `{ "error": message }`. Invalid payloads
//! get 400, everything else 500.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use synkro_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("No authorization header provided")]
    MissingToken,

    #[error("User not authenticated or email not available")]
    Unauthenticated,

    #[error("Invalid payload: {0}")]
    Validation(String),

    #[error("Barbershop not found")]
    BarbershopNotFound,

    /// Backend table/auth call failed
    #[error(transparent)]
    Backend(#[from] ClientError),

    #[error("Billing provider error: {0}")]
    Billing(String),
}

impl FunctionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for FunctionError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Function failed");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type FunctionResult<T> = Result<T, FunctionError>;
