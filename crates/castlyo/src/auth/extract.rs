use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ServiceError;
use crate::ids::UserId;
use crate::users::{Role, UserRepository};

use super::token::{bearer_token, TokenIssuer};

/// Caller identity resolved from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub role: Role,
}

impl AuthUser {
    pub fn require(&self, role: Role) -> Result<(), ServiceError> {
        if self.role == role {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!("role {role} required")))
        }
    }
}

/// Installed as a request extension by the app router; resolves `AuthUser`.
pub struct Authenticator {
    tokens: Arc<TokenIssuer>,
    users: Arc<dyn UserRepository>,
}

impl Authenticator {
    pub fn new(tokens: Arc<TokenIssuer>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    /// Verify the token and confirm the account is still active.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let claims = self.tokens.verify(token)?;
        let user = self
            .users
            .fetch(claims.sub)?
            .ok_or_else(|| ServiceError::Unauthorized("account no longer exists".to_string()))?;

        if !user.is_active() {
            return Err(ServiceError::Unauthorized("account is deactivated".to_string()));
        }

        Ok(AuthUser {
            id: user.id,
            role: user.role,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = parts
            .extensions
            .get::<Arc<Authenticator>>()
            .cloned()
            .ok_or_else(|| ServiceError::Token("authenticator extension missing".to_string()))?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = bearer_token(header)?;

        authenticator.authenticate(token)
    }
}
