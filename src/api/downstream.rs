use crate::config::DownstreamConfig;
use crate::error::RelayError;
use crate::types::pet::{
    AccessTokenRequest, GetModuleForward, ModuleStatusUpdate, SessionRequest, SetModuleRequest,
};
use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

pub const SET_MODULE_STATUS_PATH: &str = "unauth/setModule";
pub const ACCESS_TOKEN_PATH: &str = "unauth/getAccessToken";
pub const SESSION_PATH: &str = "rpi/session";
pub const GET_MODULE_PATH: &str = "auth/getModule";
pub const SET_MODULE_PATH: &str = "unauth/setModule";

/// Successful downstream answer, relayed to the caller byte for byte.
#[derive(Debug, Clone)]
pub struct DownstreamReply {
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl DownstreamReply {
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

impl IntoResponse for DownstreamReply {
    fn into_response(self) -> Response {
        let mut resp = (StatusCode::OK, Body::from(self.body)).into_response();
        if let Some(ct) = self.content_type {
            resp.headers_mut().insert(CONTENT_TYPE, ct);
        }
        resp
    }
}

/// Stateless single-shot POST; no retries, no timeout beyond the client's own.
pub struct DownstreamApi;

impl DownstreamApi {
    pub async fn post_json<T>(
        client: &reqwest::Client,
        url: Url,
        body: &T,
    ) -> Result<DownstreamReply, RelayError>
    where
        T: serde::Serialize,
    {
        let resp = client.post(url.clone()).json(body).send().await?;
        let status = resp.status();
        let content_type = resp.headers().get(CONTENT_TYPE).cloned();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            warn!(%url, %status, "downstream answered with error status");
            let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                if bytes.is_empty() {
                    Value::Null
                } else {
                    Value::String(String::from_utf8_lossy(&bytes).into_owned())
                }
            });
            return Err(RelayError::UpstreamStatus { status, body });
        }

        debug!(%url, body = %String::from_utf8_lossy(&bytes), "downstream reply");
        Ok(DownstreamReply {
            content_type,
            body: bytes,
        })
    }
}

/// The two downstream services behind one shared HTTP client.
#[derive(Clone)]
pub struct DownstreamClient {
    http: reqwest::Client,
    api_base: Url,
    module_base: Url,
}

impl DownstreamClient {
    pub fn new(cfg: &DownstreamConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("petfeed-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, cfg))
    }

    pub fn with_client(http: reqwest::Client, cfg: &DownstreamConfig) -> Self {
        Self {
            http,
            api_base: as_directory(cfg.api_base.clone()),
            module_base: as_directory(cfg.module_base.clone()),
        }
    }

    /// Feeder telemetry into the API service.
    pub async fn set_module_status(
        &self,
        body: &ModuleStatusUpdate,
    ) -> Result<DownstreamReply, RelayError> {
        let url = self.api_base.join(SET_MODULE_STATUS_PATH)?;
        DownstreamApi::post_json(&self.http, url, body).await
    }

    pub async fn get_access_token(
        &self,
        body: &AccessTokenRequest,
    ) -> Result<DownstreamReply, RelayError> {
        let url = self.api_base.join(ACCESS_TOKEN_PATH)?;
        DownstreamApi::post_json(&self.http, url, body).await
    }

    pub async fn get_session(&self, body: &SessionRequest) -> Result<DownstreamReply, RelayError> {
        let url = self.api_base.join(SESSION_PATH)?;
        DownstreamApi::post_json(&self.http, url, body).await
    }

    pub async fn get_module(&self, body: &GetModuleForward) -> Result<DownstreamReply, RelayError> {
        let url = self.api_base.join(GET_MODULE_PATH)?;
        DownstreamApi::post_json(&self.http, url, body).await
    }

    /// Module configuration into the module-management service.
    pub async fn set_module(&self, body: &SetModuleRequest) -> Result<DownstreamReply, RelayError> {
        let url = self.module_base.join(SET_MODULE_PATH)?;
        DownstreamApi::post_json(&self.http, url, body).await
    }
}

/// `Url::join` replaces the last segment unless the base ends with `/`.
fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
