use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::DownstreamReply;
use crate::config::ErrorMode;
use crate::error::RelayError;
use crate::middleware::{AccessToken, RelayJson};
use crate::router::RelayState;
use crate::types::pet::{
    AccessTokenRequest, FoodEatRequest, GetModuleForward, GetModuleRequest, ModuleStatusUpdate,
    SessionRequest, SetModuleRequest,
};

pub const GREETING: &str = "HELLO JBJ";

/// GET / -> fixed greeting.
pub async fn index() -> &'static str {
    GREETING
}

/// GET /health -> "ok" once the registry answers.
pub async fn health(State(state): State<RelayState>) -> Result<&'static str, RelayError> {
    state.store.ping().await?;
    Ok("ok")
}

/// POST /foodeat -> echo the telemetry, then push it to the API service in the background.
///
/// The caller only ever sees its own body; the downstream outcome is logged.
pub async fn food_eat(
    State(state): State<RelayState>,
    RelayJson(body): RelayJson<Value>,
) -> Response {
    let req = match food_eat_request(&body) {
        Ok(req) => req,
        Err(e) => {
            return match state.error_mode {
                ErrorMode::Legacy => {
                    warn!(error = %e, "foodeat telemetry malformed; echoed without forwarding");
                    Json(body).into_response()
                }
                ErrorMode::Structured => e.into_response(),
            };
        }
    };

    let update = ModuleStatusUpdate::from(req);
    let downstream = state.downstream.clone();
    tokio::spawn(async move {
        match downstream.set_module_status(&update).await {
            Ok(reply) => info!(reply = ?reply.json(), "foodeat forwarded"),
            Err(e) => error!(error = %e, "foodeat forward failed"),
        }
    });

    Json(body).into_response()
}

/// Decode by field name only; a legacy array body is never read positionally.
fn food_eat_request(body: &Value) -> Result<FoodEatRequest, RelayError> {
    let Some(fields) = body.as_object() else {
        return Err(RelayError::InvalidRequest(
            "foodeat: body must be a JSON object".to_string(),
        ));
    };
    serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| RelayError::InvalidRequest(format!("foodeat: {e}")))
}

/// POST /foodleft, /waterdrink, /waterlack -> echo only, nothing leaves the relay.
pub async fn echo_telemetry(RelayJson(body): RelayJson<Value>) -> Json<Value> {
    debug!(body = %body, "telemetry echoed");
    Json(body)
}

/// POST /getAccessToken -> API service `unauth/getAccessToken`.
pub async fn get_access_token(
    State(state): State<RelayState>,
    AccessToken(token): AccessToken,
    RelayJson(req): RelayJson<AccessTokenRequest>,
) -> Response {
    debug!(access_token = ?token, "getAccessToken");
    let result = state.downstream.get_access_token(&req).await;
    relay_reply(state.error_mode, result)
}

/// POST /getSession -> API service `rpi/session`.
pub async fn get_session(
    State(state): State<RelayState>,
    AccessToken(token): AccessToken,
    RelayJson(req): RelayJson<SessionRequest>,
) -> Response {
    debug!(access_token = ?token, "getSession");
    let result = state.downstream.get_session(&req).await;
    relay_reply(state.error_mode, result)
}

/// POST /getModule -> API service `auth/getModule`, token moved into the body.
pub async fn get_module(
    State(state): State<RelayState>,
    AccessToken(token): AccessToken,
    RelayJson(req): RelayJson<GetModuleRequest>,
) -> Response {
    debug!(access_token = ?token, "getModule");
    let forward = GetModuleForward::new(req, token);
    let result = state.downstream.get_module(&forward).await;
    relay_reply(state.error_mode, result)
}

/// POST /setModule -> module service `unauth/setModule`.
pub async fn set_module(
    State(state): State<RelayState>,
    RelayJson(req): RelayJson<SetModuleRequest>,
) -> Response {
    let result = state.downstream.set_module(&req).await;
    relay_reply(state.error_mode, result)
}

fn relay_reply(mode: ErrorMode, result: Result<DownstreamReply, RelayError>) -> Response {
    match result {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            error!(error = %e, "downstream relay failed");
            match mode {
                ErrorMode::Structured => e.into_response(),
                ErrorMode::Legacy => Json(e.legacy_body()).into_response(),
            }
        }
    }
}
