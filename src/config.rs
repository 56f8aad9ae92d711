use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Environment prefix for every configuration key, e.g.
/// `PETFEED_DOWNSTREAM__API_BASE=http://10.0.0.2:8079/`.
pub const ENV_PREFIX: &str = "PETFEED_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub basic: BasicConfig,
    #[serde(default)]
    pub downstream: DownstreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub loglevel: String,
    pub database_url: String,
    pub error_mode: ErrorMode,
    /// How often expired sessions are physically removed.
    pub session_sweep_secs: u64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            loglevel: "info".to_string(),
            database_url: "sqlite:petfeed.db".to_string(),
            error_mode: ErrorMode::default(),
            session_sweep_secs: 60,
        }
    }
}

/// Base addresses of the two downstream services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// auth/unauth API service (access tokens, sessions, module status).
    pub api_base: Url,
    /// module-management service.
    pub module_base: Url,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            api_base: Url::parse("http://127.0.0.1:8079/").expect("static url"),
            module_base: Url::parse("http://127.0.0.1:4500/").expect("static url"),
        }
    }
}

/// How relay failures are reported to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Distinct status codes and a `{"error": {...}}` body.
    #[default]
    Structured,
    /// HTTP 200 with the serialized error object, as older gateways expect.
    /// Bodies without a JSON content type read as `{}`, and arrays are accepted.
    /// Malformed JSON and oversized bodies are still rejected with 400 / 413.
    Legacy,
}

impl Config {
    /// Defaults overlaid with `PETFEED_*` environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
