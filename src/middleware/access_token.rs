use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Value of the caller's `x-access-token` header, if any.
/// The relay never checks it; it is only logged or handed downstream.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(pub Option<String>);

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Self(token))
    }
}
