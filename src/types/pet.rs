//! Gateway-facing and downstream-facing payloads of the relay routes.
//!
//! Every field is optional and carried as raw JSON: the relay does not judge
//! shapes, it only renames. Absent fields stay absent in the outbound body.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::middleware::RelayPayload;

/// `POST /foodeat` as sent by the gateway.
///
/// `data` holds the feeder's raw sensor flags (`EATEN`, `LEFT`, `DRINK`,
/// `WATER_LACK`) and must be a JSON object.
#[derive(Debug, Clone, Deserialize)]
pub struct FoodEatRequest {
    #[serde(default)]
    pub module_id: Option<Value>,
    pub data: Map<String, Value>,
}

/// Body of `unauth/setModule` on the API service.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModuleStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<Value>,
    pub data: ModuleStatus,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ModuleStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iseaten: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drink: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water: Option<Value>,
}

impl From<FoodEatRequest> for ModuleStatusUpdate {
    fn from(req: FoodEatRequest) -> Self {
        let mut flags = req.data;
        let mut take = |key: &str| flags.remove(key).filter(|v| !v.is_null());
        Self {
            module_id: req.module_id,
            data: ModuleStatus {
                iseaten: take("EATEN"),
                left: take("LEFT"),
                drink: take("DRINK"),
                water: take("WATER_LACK"),
            },
        }
    }
}

/// `POST /getAccessToken`, relayed as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pw: Option<Value>,
}

/// `POST /getSession`, relayed as is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<Value>,
}

/// `POST /getModule` as sent by the gateway; the token arrives as a header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetModuleRequest {
    #[serde(default)]
    pub module_id: Option<Value>,
}

/// Body of `auth/getModule`. The API service reads the token from
/// `headers["x-access-token"]` inside the JSON body, not from HTTP headers.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GetModuleForward {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<Value>,
    pub headers: ForwardedHeaders,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ForwardedHeaders {
    #[serde(rename = "x-access-token", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl GetModuleForward {
    pub fn new(req: GetModuleRequest, access_token: Option<String>) -> Self {
        Self {
            module_id: req.module_id,
            headers: ForwardedHeaders { access_token },
        }
    }
}

/// `POST /setModule`, relayed as is to the module service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SetModuleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_data: Option<Value>,
}

impl RelayPayload for AccessTokenRequest {}
impl RelayPayload for SessionRequest {}
impl RelayPayload for GetModuleRequest {}
impl RelayPayload for SetModuleRequest {}
