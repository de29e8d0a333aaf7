//! Access token plumbing.
//!
//! Buyers authenticate against the storefront's identity service, which shares the HS256 secret with this server and
//! issues the tokens. This module only needs to validate tokens and expose the claims to handlers; [`TokenIssuer`]
//! can also mint tokens, which the identity service and the endpoint tests both use.

use actix_web::{dev::Payload, error::ErrorInternalServerError, Error as ActixWebError, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use checkout_engine::db_types::{Role, Roles};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The buyer id the token was issued to.
    pub sub: i64,
    pub roles: Roles,
    /// Unix expiry timestamp. The JWT library rejects expired tokens during validation.
    pub exp: i64,
}

impl JwtClaims {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// Claims are placed in the request extensions by the authentication middleware. Handlers that declare a `JwtClaims`
/// parameter pick them up from there, so a handler reaching this extractor outside the authenticated scope is a
/// routing bug, not a client error.
impl FromRequest for JwtClaims {
    type Error = ActixWebError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<JwtClaims>() {
            Some(claims) => ready(Ok(claims.clone())),
            None => {
                warn!("No JWT claims found in request extensions");
                ready(Err(ErrorInternalServerError("No JWT claims found in request extensions")))
            },
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Issue a new access token for the given buyer and roles. The token expires after `duration`, or 24 hours when
    /// none is given.
    pub fn issue_token(&self, sub: i64, roles: Roles, duration: Option<Duration>) -> Result<String, AuthError> {
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        let exp = (Utc::now() + duration).timestamp();
        let claims = JwtClaims { sub, roles, exp };
        let key = EncodingKey::from_secret(self.config.jwt_secret.reveal().as_bytes());
        encode(&Header::default(), &claims, &key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let key = DecodingKey::from_secret(self.config.jwt_secret.reveal().as_bytes());
        decode::<JwtClaims>(token, &key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidToken => AuthError::PoorlyFormattedToken(e.to_string()),
                _ => AuthError::ValidationError(e.to_string()),
            })
    }
}
