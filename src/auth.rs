use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::SessionError,
    models::{Session, SessionUser},
};

/// Name of the cookie the browser client keeps the Supabase access token in.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Claims
///
/// The subset of a Supabase access token payload the console relies on.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the auth.users id, which keys the role lookup.
    pub sub: Uuid,
    /// Expiration Time (exp). Past this point the session no longer exists.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Audience (aud): "authenticated" for signed-in users.
    pub aud: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// SessionDecoder
///
/// Verifies Supabase access tokens and turns them into `Session`s. Shared by every
/// Session Provider backed by Supabase Auth.
#[derive(Clone)]
pub struct SessionDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl SessionDecoder {
    pub fn new(jwt_secret: &str, audience: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.set_audience(&[audience]);

        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// decode
    ///
    /// No token, or an expired one, means there is no session. Any other
    /// verification failure (bad signature, wrong audience, garbage) is an error.
    pub fn decode(&self, token: Option<&str>) -> Result<Option<Session>, SessionError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let token_data = match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => data,
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("access token expired, treating as signed out");
                    return Ok(None);
                }
                _ => return Err(SessionError::InvalidToken(e)),
            },
        };

        let claims = token_data.claims;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0).ok_or_else(
            || SessionError::MalformedResponse(format!("exp claim out of range: {}", claims.exp)),
        )?;

        Ok(Some(Session {
            user: SessionUser {
                id: claims.sub,
                email: claims.email,
            },
            expires_at,
        }))
    }
}

/// AccessToken
///
/// Extracts the caller's access token, if any: the `Authorization: Bearer` header
/// first, then the `sb-access-token` cookie set by the browser client. Never rejects;
/// an absent token simply means no session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessToken(pub Option<String>);

impl AccessToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for AccessToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        if let Some(token) = bearer {
            return Ok(AccessToken(Some(token.to_string())));
        }

        let from_cookie = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == ACCESS_TOKEN_COOKIE && !value.is_empty())
            .map(|(_, value)| value.to_string());

        Ok(AccessToken(from_cookie))
    }
}
