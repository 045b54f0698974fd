use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audit::{AuditEvent, AuditTrail, ConsentKind, ConsentRecord};
use crate::auth::password::{validate_password, PasswordHasher};
use crate::auth::service::validate_display_name;
use crate::auth::AuthUser;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::profiles::ProfileService;

use super::domain::{AccountStatus, User, UserView};
use super::repository::UserRepository;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccount {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarketingConsent {
    pub granted: bool,
}

/// Self-service operations on the caller's own account.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    profiles: Arc<ProfileService>,
    hasher: PasswordHasher,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        profiles: Arc<ProfileService>,
        hasher: PasswordHasher,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            profiles,
            hasher,
            audit,
            clock,
        }
    }

    pub fn me(&self, auth: &AuthUser) -> Result<UserView, ServiceError> {
        Ok(self.load(auth)?.view())
    }

    pub fn update_me(
        &self,
        auth: &AuthUser,
        update: UpdateAccount,
    ) -> Result<UserView, ServiceError> {
        let mut user = self.load(auth)?;
        if let Some(name) = update.display_name {
            user.display_name = validate_display_name(&name)?;
        }
        user.updated_at = self.clock.now();
        self.users.update(user.clone())?;
        Ok(user.view())
    }

    pub fn change_password(
        &self,
        auth: &AuthUser,
        request: ChangePassword,
    ) -> Result<(), ServiceError> {
        let mut user = self.load(auth)?;
        if !self
            .hasher
            .verify(&request.current_password, &user.password_hash)
        {
            return Err(ServiceError::Unauthorized(
                "current password is incorrect".to_string(),
            ));
        }
        validate_password(&request.new_password)?;
        if request.new_password == request.current_password {
            return Err(ServiceError::validation(
                "new password must differ from the current one",
            ));
        }

        user.password_hash = self.hasher.hash(&request.new_password);
        user.updated_at = self.clock.now();
        self.users.update(user)?;
        self.audit
            .record(AuditEvent::new("user.password_changed", "user", auth.id).actor(auth.id));
        Ok(())
    }

    /// Deactivated accounts cannot log in and their talent profile leaves
    /// search results.
    pub fn deactivate(&self, auth: &AuthUser) -> Result<UserView, ServiceError> {
        let mut user = self.load(auth)?;
        user.status = AccountStatus::Deactivated;
        user.updated_at = self.clock.now();
        self.users.update(user.clone())?;
        self.profiles.hide_talent(auth.id)?;

        info!(user_id = %auth.id, "account deactivated");
        self.audit
            .record(AuditEvent::new("user.deactivated", "user", auth.id).actor(auth.id));
        Ok(user.view())
    }

    pub fn consents(&self, auth: &AuthUser) -> Result<Vec<ConsentRecord>, ServiceError> {
        Ok(self.audit.consents_for(auth.id)?)
    }

    pub fn update_marketing_consent(
        &self,
        auth: &AuthUser,
        consent: MarketingConsent,
    ) -> Result<ConsentRecord, ServiceError> {
        self.load(auth)?;
        let record = self
            .audit
            .consent(auth.id, ConsentKind::Marketing, consent.granted, None)?;
        Ok(record)
    }

    fn load(&self, auth: &AuthUser) -> Result<User, ServiceError> {
        self.users
            .fetch(auth.id)?
            .ok_or(ServiceError::NotFound("user"))
    }
}
