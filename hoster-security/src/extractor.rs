use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::identity::{resolve, AuthContext};

/// Axum extractor for [`AuthContext`]. Never rejects: an absent or
/// unparseable identity resolves to the unauthenticated zero value, exactly
/// as the typed context getter the spec describes — handlers decide for
/// themselves whether authentication was required.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(resolve(&parts.headers))
    }
}
