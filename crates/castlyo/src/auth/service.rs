use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditTrail, ConsentKind, ConsentRecord};
use crate::clock::Clock;
use crate::error::{RepositoryError, ServiceError};
use crate::ids::UserId;
use crate::users::domain::{is_plausible_email, normalize_email};
use crate::users::{AccountStatus, EmailVerification, Role, User, UserRepository, UserView};

use super::mailer::{Mailer, OutboundEmail};
use super::password::{validate_password, PasswordHasher};
use super::token::TokenIssuer;

const MAX_DISPLAY_NAME_LEN: usize = 80;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
    #[serde(default)]
    pub accept_terms: bool,
    #[serde(default)]
    pub accept_privacy: bool,
    #[serde(default)]
    pub marketing_opt_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationView {
    pub user: UserView,
    pub verification_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Account lifecycle up to and including session issuance.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
    mailer: Arc<dyn Mailer>,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
    verification_ttl: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        tokens: Arc<TokenIssuer>,
        mailer: Arc<dyn Mailer>,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
        verification_ttl: Duration,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            mailer,
            audit,
            clock,
            verification_ttl,
        }
    }

    /// Create the account and its consent rows in one write, then mail the
    /// verification link. A mail failure does not undo the registration.
    pub fn register(&self, request: RegisterRequest) -> Result<RegistrationView, ServiceError> {
        let email = normalize_email(&request.email);
        if !is_plausible_email(&email) {
            return Err(ServiceError::validation("email address is invalid"));
        }
        validate_password(&request.password)?;
        let display_name = validate_display_name(&request.display_name)?;
        if !request.accept_terms {
            return Err(ServiceError::validation("terms of service must be accepted"));
        }
        if !request.accept_privacy {
            return Err(ServiceError::validation("privacy policy must be accepted"));
        }

        if self.users.find_by_email(&email)?.is_some() {
            return Err(ServiceError::conflict("email is already registered"));
        }

        let now = self.clock.now();
        let verification = self.new_verification();
        let user = User {
            id: UserId::generate(),
            email,
            password_hash: self.hasher.hash(&request.password),
            role: request.role,
            display_name,
            status: AccountStatus::Active,
            email_verified_at: None,
            verification: Some(verification.clone()),
            created_at: now,
            updated_at: now,
        };

        let consents = vec![
            ConsentRecord::new(user.id, ConsentKind::TermsOfService, true, None, now),
            ConsentRecord::new(user.id, ConsentKind::PrivacyPolicy, true, None, now),
            ConsentRecord::new(
                user.id,
                ConsentKind::Marketing,
                request.marketing_opt_in,
                None,
                now,
            ),
        ];

        let user = self
            .users
            .insert_with_consents(user, consents)
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => {
                    ServiceError::conflict("email is already registered")
                }
                other => ServiceError::Repository(other),
            })?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        self.audit.record(
            AuditEvent::new("user.registered", "user", user.id)
                .actor(user.id)
                .detail("role", user.role),
        );
        self.send_verification(&user, &verification);

        Ok(RegistrationView {
            user: user.view(),
            verification_required: true,
        })
    }

    pub fn verify_email(&self, request: VerifyEmailRequest) -> Result<UserView, ServiceError> {
        let token = request.token.trim();
        if token.is_empty() {
            return Err(ServiceError::validation("verification token is required"));
        }

        let mut user = self
            .users
            .find_by_verification_token(token)?
            .ok_or(ServiceError::NotFound("verification token"))?;

        let now = self.clock.now();
        match &user.verification {
            Some(pending) if pending.is_expired(now) => {
                return Err(ServiceError::validation("verification token has expired"));
            }
            _ => {}
        }

        user.email_verified_at = Some(now);
        user.verification = None;
        user.updated_at = now;
        self.users.update(user.clone())?;

        info!(user_id = %user.id, "email verified");
        self.audit
            .record(AuditEvent::new("user.email_verified", "user", user.id).actor(user.id));

        Ok(user.view())
    }

    /// Always succeeds from the caller's point of view so the endpoint cannot
    /// be used to discover which emails are registered.
    pub fn resend_verification(
        &self,
        request: ResendVerificationRequest,
    ) -> Result<(), ServiceError> {
        let email = normalize_email(&request.email);
        let Some(mut user) = self.users.find_by_email(&email)? else {
            return Ok(());
        };
        if user.is_verified() || !user.is_active() {
            return Ok(());
        }

        let verification = self.new_verification();
        user.verification = Some(verification.clone());
        user.updated_at = self.clock.now();
        self.users.update(user.clone())?;
        self.send_verification(&user, &verification);
        Ok(())
    }

    pub fn login(&self, request: LoginRequest) -> Result<TokenResponse, ServiceError> {
        let email = normalize_email(&request.email);
        let invalid = || ServiceError::Unauthorized("invalid email or password".to_string());

        let user = self.users.find_by_email(&email)?.ok_or_else(invalid)?;
        if !self.hasher.verify(&request.password, &user.password_hash) {
            warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid());
        }
        if !user.is_active() {
            return Err(ServiceError::forbidden("account is deactivated"));
        }
        if !user.is_verified() {
            return Err(ServiceError::forbidden("email address has not been verified"));
        }

        let issued = self.tokens.issue(&user)?;
        self.audit
            .record(AuditEvent::new("user.logged_in", "user", user.id).actor(user.id));

        Ok(TokenResponse {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.view(),
        })
    }

    fn new_verification(&self) -> EmailVerification {
        EmailVerification {
            token: Uuid::new_v4().simple().to_string(),
            expires_at: self.clock.now() + self.verification_ttl,
        }
    }

    fn send_verification(&self, user: &User, verification: &EmailVerification) {
        let mut variables = BTreeMap::new();
        variables.insert("display_name".to_string(), user.display_name.clone());
        variables.insert("token".to_string(), verification.token.clone());
        variables.insert(
            "expires_at".to_string(),
            verification.expires_at.to_rfc3339(),
        );

        let email = OutboundEmail {
            to: user.email.clone(),
            template: "verify_email".to_string(),
            subject: "Confirm your Castlyo email address".to_string(),
            variables,
        };

        if let Err(err) = self.mailer.send(email) {
            warn!(user_id = %user.id, error = %err, "verification email not sent");
        }
    }
}

pub(crate) fn validate_display_name(raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("display name is required"));
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ServiceError::validation(format!(
            "display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
