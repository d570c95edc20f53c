use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    claims::Claims,
    jwt::{JwtKeys, TokenError},
};
use crate::error::AppError;

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        let msg = match e {
            TokenError::Malformed | TokenError::InvalidSignature => "Invalid token format",
            TokenError::Expired => "Token has expired",
            TokenError::IncompletePayload => "Invalid token payload",
        };
        AppError::Forbidden(msg.into())
    }
}

/// Pulls `<token>` out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").or_else(|| auth.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthenticated("Access token required".into()))
}

/// Verified token claims of the caller. A missing credential rejects with 401,
/// an untrustworthy one with 403.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "bearer token rejected");
            AppError::from(e)
        })?;
        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
        assert_eq!(bearer_token(&headers("bearer xyz")).unwrap(), "xyz");
    }

    #[test]
    fn missing_or_wrong_scheme_is_unauthenticated() {
        for h in [HeaderMap::new(), headers("Basic Zm9vOmJhcg=="), headers("Bearer   ")] {
            let err = bearer_token(&h).unwrap_err();
            assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn token_errors_are_forbidden() {
        for e in [
            TokenError::Malformed,
            TokenError::InvalidSignature,
            TokenError::Expired,
            TokenError::IncompletePayload,
        ] {
            assert_eq!(AppError::from(e).status(), axum::http::StatusCode::FORBIDDEN);
        }
        assert_eq!(AppError::from(TokenError::Expired).to_string(), "Token has expired");
    }
}
