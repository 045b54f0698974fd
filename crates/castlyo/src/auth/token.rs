use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::ids::UserId;
use crate::users::{Role, User};

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// Signs and verifies HS256 access tokens.
///
/// Expiry is checked against the injected clock rather than the library's
/// wall-clock check so that token lifetimes follow the service clock.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock,
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedToken, ServiceError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| ServiceError::Token(err.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.ttl.num_seconds(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "rejected access token");
            ServiceError::Unauthorized("invalid access token".to_string())
        })?;

        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(ServiceError::Unauthorized("access token expired".to_string()));
        }

        Ok(data.claims)
    }
}

/// Strip the `Bearer ` prefix from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, ServiceError> {
    let value =
        header.ok_or_else(|| ServiceError::Unauthorized("missing Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ServiceError::Unauthorized(
                "invalid Authorization header format, expected 'Bearer <token>'".to_string(),
            )
        })
}
