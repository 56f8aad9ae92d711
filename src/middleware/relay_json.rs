use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::ErrorMode;
use crate::error::RelayError;
use crate::router::RelayState;

/// Payload decodable from a relay body.
pub trait RelayPayload: DeserializeOwned {
    /// Decode a non-object body accepted in legacy mode (e.g. an array).
    /// Named fields cannot be read from it, so by default every field is absent.
    fn from_loose(_value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(Map::new()))
    }
}

impl RelayPayload for Value {
    fn from_loose(value: Value) -> Result<Self, serde_json::Error> {
        Ok(value)
    }
}

/// JSON body, decoded into `T`.
///
/// Structured mode accepts only JSON objects. Legacy mode reads a body sent
/// without a JSON content type as `{}` and lets non-object bodies through
/// [`RelayPayload::from_loose`]. Rejections come back as [`RelayError`] so
/// bad bodies share the relay's error format instead of axum's plain-text one.
pub struct RelayJson<T>(pub T);

impl<T> FromRequest<RelayState> for RelayJson<T>
where
    T: RelayPayload,
{
    type Rejection = RelayError;

    async fn from_request(req: Request, state: &RelayState) -> Result<Self, Self::Rejection> {
        let legacy = state.error_mode == ErrorMode::Legacy;
        let value = match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => value,
            Err(JsonRejection::MissingJsonContentType(_)) if legacy => Value::Object(Map::new()),
            Err(rejection) => return Err(rejection_to_error(rejection)),
        };

        // objects always decode by field name, never by position
        if value.is_object() {
            return Ok(RelayJson(serde_json::from_value(value)?));
        }
        if legacy {
            return Ok(RelayJson(T::from_loose(value)?));
        }
        Err(RelayError::InvalidRequest(
            "request body must be a JSON object".to_string(),
        ))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> RelayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::PayloadTooLarge
    } else {
        RelayError::InvalidRequest(rejection.body_text())
    }
}
