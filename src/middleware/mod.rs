pub mod access_token;
pub mod relay_json;

pub use access_token::{ACCESS_TOKEN_HEADER, AccessToken};
pub use relay_json::{RelayJson, RelayPayload};
