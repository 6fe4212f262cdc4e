// src/auth.rs
//! Caller identity from the identity provider's HS256 access tokens

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
}

impl AuthConfig {
    pub fn new(jwt_secret: Option<String>) -> Self {
        Self { jwt_secret }
    }

    /// Verify signature (and expiry when the token carries one)
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let secret = self.jwt_secret.as_deref().ok_or(AuthError::NotConfigured)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::TokenVerificationFailed
        })?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        Ok(token_data.claims)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    NotConfigured,
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    MissingSubject,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::NotConfigured => "Token verification secret not configured",
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::MissingSubject => "Token has no subject",
        }
    }
}

fn bearer_token<'r>(req: &'r Request<'_>) -> Result<&'r str, AuthError> {
    match req.headers().get_one("Authorization") {
        Some(header) => header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidToken),
        None => Err(AuthError::MissingToken),
    }
}

/// Caller identity. Never fails: a missing, malformed or unverifiable token
/// makes the caller anonymous.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub user_id: Option<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn resolve(auth_config: &AuthConfig, token: Result<&str, AuthError>) -> Self {
        let claims = token.and_then(|token| auth_config.verify_token(token));
        match claims {
            Ok(claims) => Self {
                user_id: Some(claims.sub),
            },
            Err(AuthError::MissingToken) => Self::anonymous(),
            Err(e) => {
                warn!("Treating caller as anonymous: {}", e.message());
                Self::anonymous()
            }
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Identity {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let identity = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(auth_config) => Identity::resolve(auth_config, bearer_token(req)),
            _ => Identity::anonymous(),
        };
        Outcome::Success(identity)
    }
}
