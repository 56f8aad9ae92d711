use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Sessions become unreadable this long after `created_at`.
pub const SESSION_TTL_SECS: i64 = 60 * 60;
pub const SESSION_TTL_MILLIS: i64 = SESSION_TTL_SECS * 1000;

/// Device reference embedded in a user record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDevice {
    #[serde(rename = "type")]
    pub device_type: Option<i64>,
    pub serial: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub pw: Option<String>,
    #[serde(rename = "device")]
    pub devices: Vec<UserDevice>,
}

/// Catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Device {
    pub id: i64,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegisteredDevice {
    pub id: i64,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub serial: Option<String>,
    pub status: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: i64,
    pub sid: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(SESSION_TTL_SECS)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Counter {
    pub id: i64,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Feeder telemetry (`type_id = 1`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeederData {
    pub is_eaten: Option<bool>,
    pub time_eaten: Option<DateTime<Utc>>,
    pub num_eaten: Option<i64>,
}

/// Water dispenser telemetry (`type_id = 2`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterData {
    pub time_water: Option<DateTime<Utc>>,
    pub is_water: Option<bool>,
}

/// Per-module payload, discriminated by the module's `type_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleData {
    Feeder(FeederData),
    Water(WaterData),
    /// Unknown module type or a payload outside the typed shapes.
    Other(Map<String, Value>),
}

const FEEDER_KEYS: [&str; 3] = ["isEaten", "timeEaten", "numEaten"];
const WATER_KEYS: [&str; 2] = ["timeWater", "isWater"];

impl ModuleData {
    pub const FEEDER_TYPE: i64 = 1;
    pub const WATER_TYPE: i64 = 2;

    /// Interpret a stored or inbound payload in the light of `type_id`.
    /// Payloads that do not fit the typed shape are kept verbatim.
    pub fn from_value(type_id: i64, value: Value) -> Result<Self, serde_json::Error> {
        let map: Map<String, Value> = serde_json::from_value(value)?;
        let typed = match type_id {
            Self::FEEDER_TYPE if fits(&map, &FEEDER_KEYS, &WATER_KEYS) => {
                serde_json::from_value(Value::Object(map.clone()))
                    .ok()
                    .map(ModuleData::Feeder)
            }
            Self::WATER_TYPE if fits(&map, &WATER_KEYS, &FEEDER_KEYS) => {
                serde_json::from_value(Value::Object(map.clone()))
                    .ok()
                    .map(ModuleData::Water)
            }
            _ => None,
        };
        Ok(typed.unwrap_or(ModuleData::Other(map)))
    }

    /// Flat JSON object. Typed variants emit all five telemetry keys,
    /// the other module type's keys as `null`.
    pub fn to_value(&self) -> Value {
        match self {
            ModuleData::Feeder(d) => json!({
                "isEaten": d.is_eaten,
                "timeEaten": d.time_eaten,
                "numEaten": d.num_eaten,
                "timeWater": null,
                "isWater": null,
            }),
            ModuleData::Water(d) => json!({
                "isEaten": null,
                "timeEaten": null,
                "numEaten": null,
                "timeWater": d.time_water,
                "isWater": d.is_water,
            }),
            ModuleData::Other(map) => Value::Object(map.clone()),
        }
    }
}

/// Every key is either one of `own`, or one of `foreign` holding null.
fn fits(map: &Map<String, Value>, own: &[&str], foreign: &[&str]) -> bool {
    map.iter().all(|(k, v)| {
        own.contains(&k.as_str()) || (foreign.contains(&k.as_str()) && v.is_null())
    })
}

impl Serialize for ModuleData {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegisteredModule {
    pub id: i64,
    pub serial: String,
    pub type_id: i64,
    pub name: String,
    pub data: ModuleData,
    pub reservation: Option<DateTime<Utc>>,
}

/// Insert form of [`RegisteredModule`].
#[derive(Debug, Clone)]
pub struct NewModule {
    pub serial: String,
    pub type_id: i64,
    pub name: String,
    pub data: ModuleData,
    pub reservation: Option<DateTime<Utc>>,
}
