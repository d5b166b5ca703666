//! Session-token verification.
//!
//! The sign-in flow issues an HS256 JWT whose subject is the wallet address of
//! the signed-in user. Requests present it as a bearer token or in the
//! `session` cookie.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::AppState;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Wallet address of the signed-in user
    pub sub: String,
    pub exp: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("session has no address")]
    MissingAddress,
    #[error("session signing key is not configured")]
    NoSigningKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        debug!(reason = %self, "Rejecting unauthenticated request");
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// A blank secret would let anyone mint tokens; such a signer accepts nothing
    configured: bool,
}

impl SessionSigner {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            configured: !secret.expose_secret().trim().is_empty(),
        }
    }

    /// Issues a token for `address` valid for `ttl_secs`. Used by tests and tooling.
    pub fn issue(&self, address: &str, ttl_secs: u64) -> Result<String, AuthError> {
        if !self.configured {
            return Err(AuthError::NoSigningKey);
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let claims = SessionClaims {
            sub: address.to_string(),
            exp: now + ttl_secs,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        if !self.configured {
            return Err(AuthError::NoSigningKey);
        }
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::MissingAddress);
        }
        Ok(data.claims)
    }
}

/// Authenticated caller; extraction fails with 401 `Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub address: String,
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts).ok_or(AuthError::MissingToken)?;
        let claims = state.sessions.verify(&token)?;
        Ok(AuthSession { address: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn signer() -> SessionSigner {
        SessionSigner::new(&SecretString::new("test-secret".into()))
    }

    #[test]
    fn issued_tokens_verify() {
        let token = signer().issue("0xabc", 60).unwrap();
        assert_eq!(signer().verify(&token).unwrap().sub, "0xabc");

        let other = SessionSigner::new(&SecretString::new("other".into()));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn blank_secret_accepts_no_tokens() {
        let blank = SessionSigner::new(&SecretString::new(String::new()));
        let claims = SessionClaims {
            sub: "0xattacker".into(),
            exp: u64::MAX / 2,
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b""),
        )
        .unwrap();
        assert!(matches!(blank.verify(&forged), Err(AuthError::NoSigningKey)));
        assert!(matches!(blank.issue("0xabc", 60), Err(AuthError::NoSigningKey)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let s = signer();
        let claims = SessionClaims {
            sub: "0xabc".into(),
            exp: 1,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &s.encoding).unwrap();
        assert!(matches!(s.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn reads_bearer_then_cookie() {
        let (parts, _) = Request::builder()
            .header("cookie", "theme=dark; session=from-cookie")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("from-cookie"));

        let (parts, _) = Request::builder()
            .header("authorization", "Bearer from-header")
            .header("cookie", "session=from-cookie")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("from-header"));
    }
}
