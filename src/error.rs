use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::{Value, json};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum RelayError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Upstream error with status: {status}")]
    UpstreamStatus { status: StatusCode, body: Value },
}

impl RelayError {
    /// Shape of the error as older gateways saw it: a serialized error
    /// object delivered with HTTP 200.
    pub fn legacy_body(&self) -> Value {
        let (code, status) = match self {
            RelayError::Reqwest(e) if e.is_timeout() => ("ETIMEDOUT", None),
            RelayError::Reqwest(e) => ("ERR_NETWORK", e.status().map(|s| s.as_u16())),
            RelayError::UpstreamStatus { status, .. } if status.is_client_error() => {
                ("ERR_BAD_REQUEST", Some(status.as_u16()))
            }
            RelayError::UpstreamStatus { status, .. } => {
                ("ERR_BAD_RESPONSE", Some(status.as_u16()))
            }
            RelayError::InvalidRequest(_) | RelayError::Json(_) => ("ERR_BAD_REQUEST", None),
            RelayError::PayloadTooLarge => ("ERR_BAD_REQUEST", Some(413)),
            RelayError::UrlParse(_) => ("ERR_INVALID_URL", None),
            RelayError::DatabaseError(_) => ("ERR_INTERNAL", None),
        };
        json!({
            "name": "Error",
            "message": self.to_string(),
            "code": code,
            "status": status,
        })
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            RelayError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "INVALID_REQUEST".to_string(),
                    message: msg,
                    details: None,
                },
            ),
            RelayError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ApiErrorBody {
                    code: "PAYLOAD_TOO_LARGE".to_string(),
                    message: "request body too large".to_string(),
                    details: None,
                },
            ),
            RelayError::Json(e) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "INVALID_REQUEST".to_string(),
                    message: e.to_string(),
                    details: None,
                },
            ),
            RelayError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    details: None,
                },
            ),
            RelayError::Reqwest(_) | RelayError::UrlParse(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Downstream service is unavailable.".to_string(),
                    details: None,
                },
            ),
            RelayError::UpstreamStatus { status, body } => {
                let details = (!body.is_null()).then_some(body);
                if status.is_client_error() {
                    (
                        status,
                        ApiErrorBody {
                            code: "UPSTREAM_REJECTED".to_string(),
                            message: "Downstream service rejected the request.".to_string(),
                            details,
                        },
                    )
                } else {
                    (
                        StatusCode::BAD_GATEWAY,
                        ApiErrorBody {
                            code: "UPSTREAM_ERROR".to_string(),
                            message: format!("Downstream service failed with {status}."),
                            details,
                        },
                    )
                }
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
