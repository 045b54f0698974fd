use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditEntry, AuditEvent, AuditTrail, ConsentKind};
use crate::auth::AuthUser;
use crate::billing::{BillingService, EntitlementKind};
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::ids::{PermissionId, UserId};
use crate::profiles::{ProfileRepository, Visibility};
use crate::users::Role;

use super::domain::{transition, ContactPermission, PermissionAction, PermissionStatus};
use super::repository::PermissionRepository;

const MAX_MESSAGE_LEN: usize = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub talent_id: UserId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Grant,
    Deny,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RespondRequest {
    pub decision: Decision,
}

/// Drives the contact permission state machine and records every decision
/// in the audit and consent logs.
pub struct PermissionService {
    permissions: Arc<dyn PermissionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    billing: Arc<BillingService>,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl PermissionService {
    pub fn new(
        permissions: Arc<dyn PermissionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        billing: Arc<BillingService>,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            permissions,
            profiles,
            billing,
            audit,
            clock,
        }
    }

    /// Agency asks a talent for access to their contact details. Draws one
    /// `CONTACT_REQUEST` entitlement.
    pub fn request(
        &self,
        auth: &AuthUser,
        request: ContactRequest,
    ) -> Result<ContactPermission, ServiceError> {
        auth.require(Role::Agency)?;

        let talent = self
            .profiles
            .talent(request.talent_id)?
            .filter(|profile| profile.visibility == Visibility::Public)
            .ok_or(ServiceError::NotFound("talent profile"))?;

        let message = request
            .message
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if message
            .as_deref()
            .map(|text| text.chars().count())
            .unwrap_or(0)
            > MAX_MESSAGE_LEN
        {
            return Err(ServiceError::validation(format!(
                "message must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }

        let existing = self.permissions.find(auth.id, talent.user_id)?;
        let status = transition(
            existing.as_ref().map(|permission| permission.status),
            PermissionAction::Request,
        )
        .map_err(|err| ServiceError::conflict(err.to_string()))?;

        self.billing
            .consume(auth.id, EntitlementKind::ContactRequest, 1)?;

        let now = self.clock.now();
        let permission = match existing {
            Some(previous) => ContactPermission {
                status,
                message,
                requested_at: now,
                responded_at: None,
                updated_at: now,
                ..previous
            },
            None => ContactPermission {
                id: PermissionId::generate(),
                agency_id: auth.id,
                talent_id: talent.user_id,
                status,
                message,
                requested_at: now,
                responded_at: None,
                updated_at: now,
            },
        };

        if let Err(err) = self.permissions.save(permission.clone()) {
            self.billing
                .restore(auth.id, EntitlementKind::ContactRequest, 1);
            return Err(err.into());
        }

        info!(permission_id = %permission.id, agency_id = %auth.id, talent_id = %talent.user_id, "contact permission requested");
        self.audit.record(
            AuditEvent::new("contact_permission.requested", "contact_permission", permission.id)
                .actor(auth.id)
                .detail("talent_id", talent.user_id),
        );
        Ok(permission)
    }

    /// Talent grants or denies a pending request.
    pub fn respond(
        &self,
        auth: &AuthUser,
        id: PermissionId,
        request: RespondRequest,
    ) -> Result<ContactPermission, ServiceError> {
        let action = match request.decision {
            Decision::Grant => PermissionAction::Grant,
            Decision::Deny => PermissionAction::Deny,
        };
        self.decide(auth, id, action)
    }

    /// Talent withdraws a previously granted permission.
    pub fn revoke(
        &self,
        auth: &AuthUser,
        id: PermissionId,
    ) -> Result<ContactPermission, ServiceError> {
        self.decide(auth, id, PermissionAction::Revoke)
    }

    fn decide(
        &self,
        auth: &AuthUser,
        id: PermissionId,
        action: PermissionAction,
    ) -> Result<ContactPermission, ServiceError> {
        auth.require(Role::Talent)?;

        let mut permission = self
            .permissions
            .fetch(id)?
            .ok_or(ServiceError::NotFound("contact permission"))?;
        if permission.talent_id != auth.id {
            return Err(ServiceError::forbidden(
                "only the talent can decide on this contact permission",
            ));
        }

        let next = transition(Some(permission.status), action)
            .map_err(|err| ServiceError::conflict(err.to_string()))?;

        let now = self.clock.now();
        let before = permission.clone();
        let previous = permission.status;
        permission.status = next;
        permission.responded_at = Some(now);
        permission.updated_at = now;
        self.permissions.save(permission.clone())?;

        // The decision only stands once its consent row exists.
        if let Err(err) = self.audit.consent(
            auth.id,
            ConsentKind::ContactSharing,
            next == PermissionStatus::Granted,
            Some(permission.agency_id),
        ) {
            if let Err(revert) = self.permissions.save(before) {
                warn!(permission_id = %permission.id, error = %revert, "contact permission not reverted");
            }
            return Err(err.into());
        }

        info!(permission_id = %permission.id, from = %previous, to = %next, "contact permission decided");
        self.audit.record(
            AuditEvent::new(
                match action {
                    PermissionAction::Grant => "contact_permission.granted",
                    PermissionAction::Deny => "contact_permission.denied",
                    PermissionAction::Revoke => "contact_permission.revoked",
                    PermissionAction::Request => "contact_permission.requested",
                },
                "contact_permission",
                permission.id,
            )
            .actor(auth.id)
            .detail("agency_id", permission.agency_id)
            .detail("from", previous),
        );

        Ok(permission)
    }

    /// Audit rows for one permission, visible to the agency and the talent.
    pub fn history(
        &self,
        auth: &AuthUser,
        id: PermissionId,
    ) -> Result<Vec<AuditEntry>, ServiceError> {
        let permission = self
            .permissions
            .fetch(id)?
            .ok_or(ServiceError::NotFound("contact permission"))?;
        if auth.id != permission.agency_id && auth.id != permission.talent_id {
            return Err(ServiceError::forbidden(
                "only the agency and the talent can read this history",
            ));
        }
        Ok(self
            .audit
            .history("contact_permission", &permission.id.to_string())?)
    }

    pub fn incoming(
        &self,
        auth: &AuthUser,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, ServiceError> {
        auth.require(Role::Talent)?;
        Ok(self.permissions.for_talent(auth.id, status)?)
    }

    pub fn outgoing(
        &self,
        auth: &AuthUser,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, ServiceError> {
        auth.require(Role::Agency)?;
        Ok(self.permissions.for_agency(auth.id, status)?)
    }

    pub fn is_granted(&self, agency_id: UserId, talent_id: UserId) -> Result<bool, ServiceError> {
        Ok(self
            .permissions
            .find(agency_id, talent_id)?
            .map(|permission| permission.is_granted())
            .unwrap_or(false))
    }
}
