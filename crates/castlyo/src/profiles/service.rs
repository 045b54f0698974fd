use std::sync::Arc;

use tracing::info;

use crate::audit::{AuditEvent, AuditTrail};
use crate::auth::AuthUser;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::ids::UserId;
use crate::permissions::PermissionRepository;
use crate::search::SearchService;
use crate::users::Role;

use super::domain::{
    clean_list, clean_optional, AgencyProfile, AgencyProfileInput, ContactDetails,
    TalentProfile, TalentProfileInput, TalentProfileView, Visibility,
};
use super::repository::ProfileRepository;

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    permissions: Arc<dyn PermissionRepository>,
    search: SearchService,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        permissions: Arc<dyn PermissionRepository>,
        search: SearchService,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            permissions,
            search,
            audit,
            clock,
        }
    }

    /// Create or replace the caller's talent profile. The original
    /// `created_at` survives a replace.
    pub fn upsert_talent(
        &self,
        auth: &AuthUser,
        input: TalentProfileInput,
    ) -> Result<TalentProfileView, ServiceError> {
        auth.require(Role::Talent)?;
        let today = self.clock.today();
        input.validate(today)?;

        let now = self.clock.now();
        let existing = self.profiles.talent(auth.id)?;
        let created_at = existing.as_ref().map(|p| p.created_at).unwrap_or(now);

        let profile = TalentProfile {
            user_id: auth.id,
            stage_name: clean_optional(input.stage_name),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            birth_date: input.birth_date,
            gender: input.gender,
            height_cm: input.height_cm,
            city: input.city.trim().to_string(),
            country: input.country.trim().to_string(),
            skills: clean_list(&input.skills),
            languages: clean_list(&input.languages),
            bio: clean_optional(input.bio),
            contact: clean_contact(input.contact),
            visibility: input.visibility,
            created_at,
            updated_at: now,
        };

        self.profiles.save_talent(profile.clone())?;
        self.search.sync_talent(&profile);

        info!(user_id = %auth.id, created = existing.is_none(), "talent profile saved");
        self.audit.record(
            AuditEvent::new("talent_profile.saved", "talent_profile", auth.id)
                .actor(auth.id)
                .detail("visibility", profile.visibility.as_str()),
        );

        Ok(profile.view(true, today))
    }

    pub fn my_talent(&self, auth: &AuthUser) -> Result<TalentProfileView, ServiceError> {
        auth.require(Role::Talent)?;
        let profile = self
            .profiles
            .talent(auth.id)?
            .ok_or(ServiceError::NotFound("talent profile"))?;
        Ok(profile.view(true, self.clock.today()))
    }

    /// Hidden profiles are only visible to their owner. Contact details are
    /// revealed to the owner and to agencies holding a granted permission.
    pub fn talent(
        &self,
        viewer: Option<&AuthUser>,
        user_id: UserId,
    ) -> Result<TalentProfileView, ServiceError> {
        let profile = self
            .profiles
            .talent(user_id)?
            .ok_or(ServiceError::NotFound("talent profile"))?;

        let is_owner = viewer.map(|v| v.id == user_id).unwrap_or(false);
        if profile.visibility == Visibility::Hidden && !is_owner {
            return Err(ServiceError::NotFound("talent profile"));
        }

        let reveal = match viewer {
            _ if is_owner => true,
            Some(agency) if agency.role == Role::Agency => self
                .permissions
                .find(agency.id, user_id)?
                .map(|permission| permission.is_granted())
                .unwrap_or(false),
            _ => false,
        };

        Ok(profile.view(reveal, self.clock.today()))
    }

    pub fn upsert_agency(
        &self,
        auth: &AuthUser,
        input: AgencyProfileInput,
    ) -> Result<AgencyProfile, ServiceError> {
        auth.require(Role::Agency)?;
        input.validate()?;

        let now = self.clock.now();
        let existing = self.profiles.agency(auth.id)?;
        let profile = AgencyProfile {
            user_id: auth.id,
            company_name: input.company_name.trim().to_string(),
            website: clean_optional(input.website),
            city: input.city.trim().to_string(),
            country: input.country.trim().to_string(),
            description: clean_optional(input.description),
            contact: clean_contact(input.contact),
            created_at: existing.as_ref().map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
        };

        self.profiles.save_agency(profile.clone())?;
        info!(user_id = %auth.id, created = existing.is_none(), "agency profile saved");
        self.audit.record(
            AuditEvent::new("agency_profile.saved", "agency_profile", auth.id).actor(auth.id),
        );
        Ok(profile)
    }

    pub fn my_agency(&self, auth: &AuthUser) -> Result<AgencyProfile, ServiceError> {
        auth.require(Role::Agency)?;
        self.profiles
            .agency(auth.id)?
            .ok_or(ServiceError::NotFound("agency profile"))
    }

    pub fn agency(&self, user_id: UserId) -> Result<AgencyProfile, ServiceError> {
        self.profiles
            .agency(user_id)?
            .ok_or(ServiceError::NotFound("agency profile"))
    }

    /// Used on account deactivation; a missing profile is fine.
    pub fn hide_talent(&self, user_id: UserId) -> Result<(), ServiceError> {
        let Some(mut profile) = self.profiles.talent(user_id)? else {
            return Ok(());
        };
        profile.visibility = Visibility::Hidden;
        profile.updated_at = self.clock.now();
        self.profiles.save_talent(profile)?;
        self.search.remove_talent(user_id);
        Ok(())
    }
}

fn clean_contact(contact: ContactDetails) -> ContactDetails {
    ContactDetails {
        phone: clean_optional(contact.phone),
        email: clean_optional(contact.email),
    }
}
