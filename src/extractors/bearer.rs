//! Extract optional bearer claims from the Authorization header.
//!
//! Pass-through: requests without a token, or with one that does not
//! verify, still reach the handler with `None`. The legacy surface
//! ships an authentication guard that admits everything; policy on top
//! of these claims is out of scope here.

use crate::auth::Claims;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

#[derive(Clone, Debug)]
pub struct BearerClaims(pub Option<Claims>);

#[async_trait]
impl FromRequestParts<AppState> for BearerClaims {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|token| state.signer.verify(token));
        Ok(BearerClaims(claims))
    }
}
