use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditTrail};
use crate::auth::AuthUser;
use crate::billing::{BillingService, EntitlementKind};
use crate::clock::Clock;
use crate::error::{RepositoryError, ServiceError};
use crate::ids::{ApplicationId, JobId};
use crate::page::Page;
use crate::profiles::ProfileRepository;
use crate::search::SearchService;
use crate::users::Role;

use super::domain::{
    ApplicationStatus, JobApplication, JobFilter, JobPatch, JobPost, JobStatus, NewJobPost,
    MAX_COVER_LETTER_LEN,
};
use super::export::applications_csv;
use super::repository::{ApplicationRepository, JobRepository};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
    profiles: Arc<dyn ProfileRepository>,
    billing: Arc<BillingService>,
    search: SearchService,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
        profiles: Arc<dyn ProfileRepository>,
        billing: Arc<BillingService>,
        search: SearchService,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jobs,
            applications,
            profiles,
            billing,
            search,
            audit,
            clock,
        }
    }

    /// Publish a job for the calling agency. Draws one `JOB_POST`
    /// entitlement, handed back if the write fails.
    pub fn create(&self, auth: &AuthUser, request: NewJobPost) -> Result<JobPost, ServiceError> {
        auth.require(Role::Agency)?;
        if self.profiles.agency(auth.id)?.is_none() {
            return Err(ServiceError::forbidden(
                "an agency profile is required before posting jobs",
            ));
        }
        request.validate(self.clock.today())?;

        self.billing.consume(auth.id, EntitlementKind::JobPost, 1)?;

        let now = self.clock.now();
        let job = JobPost {
            id: JobId::generate(),
            agency_id: auth.id,
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            category: request.category,
            location: request.location.trim().to_string(),
            compensation: request
                .compensation
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            age_min: request.age_min,
            age_max: request.age_max,
            gender: request.gender,
            deadline: request.deadline,
            status: JobStatus::Open,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };

        let job = match self.jobs.insert(job) {
            Ok(job) => job,
            Err(err) => {
                self.billing.restore(auth.id, EntitlementKind::JobPost, 1);
                return Err(err.into());
            }
        };
        self.search.sync_job(&job);

        info!(job_id = %job.id, agency_id = %auth.id, "job posted");
        self.audit.record(
            AuditEvent::new("job.created", "job", job.id)
                .actor(auth.id)
                .detail("category", job.category.as_str()),
        );
        Ok(job)
    }

    /// Open jobs only, newest first.
    pub fn list(&self, filter: JobFilter) -> Result<Page<JobPost>, ServiceError> {
        let matching: Vec<JobPost> = self
            .jobs
            .all()?
            .into_iter()
            .filter(|job| job.is_open() && filter.matches(job))
            .collect();
        Ok(filter.page().slice(matching))
    }

    /// Every job the calling agency posted, closed ones included.
    pub fn posted(&self, auth: &AuthUser) -> Result<Vec<JobPost>, ServiceError> {
        auth.require(Role::Agency)?;
        Ok(self.jobs.by_agency(auth.id)?)
    }

    /// Closed jobs stay readable by their owner only.
    pub fn get(&self, viewer: Option<&AuthUser>, id: JobId) -> Result<JobPost, ServiceError> {
        let job = self.load(id)?;
        let is_owner = viewer.map(|v| v.id == job.agency_id).unwrap_or(false);
        if !job.is_open() && !is_owner {
            return Err(ServiceError::NotFound("job"));
        }
        Ok(job)
    }

    pub fn update(
        &self,
        auth: &AuthUser,
        id: JobId,
        patch: JobPatch,
    ) -> Result<JobPost, ServiceError> {
        let mut job = self.owned(auth, id)?;
        if !job.is_open() {
            return Err(ServiceError::conflict("closed jobs cannot be edited"));
        }

        patch.apply(&mut job, self.clock.today())?;
        job.updated_at = self.clock.now();
        self.jobs.update(job.clone())?;
        self.search.sync_job(&job);

        self.audit
            .record(AuditEvent::new("job.updated", "job", job.id).actor(auth.id));
        Ok(job)
    }

    pub fn close(&self, auth: &AuthUser, id: JobId) -> Result<JobPost, ServiceError> {
        let mut job = self.owned(auth, id)?;
        if !job.is_open() {
            return Err(ServiceError::conflict("job is already closed"));
        }

        let now = self.clock.now();
        job.status = JobStatus::Closed;
        job.closed_at = Some(now);
        job.updated_at = now;
        self.jobs.update(job.clone())?;
        self.search.remove_job(job.id);

        info!(job_id = %job.id, "job closed");
        self.audit
            .record(AuditEvent::new("job.closed", "job", job.id).actor(auth.id));
        Ok(job)
    }

    pub fn apply(
        &self,
        auth: &AuthUser,
        job_id: JobId,
        request: ApplyRequest,
    ) -> Result<JobApplication, ServiceError> {
        auth.require(Role::Talent)?;
        if self.profiles.talent(auth.id)?.is_none() {
            return Err(ServiceError::forbidden(
                "a talent profile is required before applying",
            ));
        }

        let job = self.load(job_id)?;
        if !job.accepts_applications_on(self.clock.today()) {
            return Err(ServiceError::conflict("job is not accepting applications"));
        }

        let cover_letter = request
            .cover_letter
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if cover_letter
            .as_deref()
            .map(|text| text.chars().count())
            .unwrap_or(0)
            > MAX_COVER_LETTER_LEN
        {
            return Err(ServiceError::validation(format!(
                "cover_letter must be at most {MAX_COVER_LETTER_LEN} characters"
            )));
        }

        let now = self.clock.now();
        let application = JobApplication {
            id: ApplicationId::generate(),
            job_id,
            talent_id: auth.id,
            cover_letter,
            status: ApplicationStatus::Submitted,
            created_at: now,
            updated_at: now,
        };

        let application = self
            .applications
            .insert(application)
            .map_err(|err| match err {
                RepositoryError::Conflict(_) => {
                    ServiceError::conflict("already applied to this job")
                }
                other => ServiceError::Repository(other),
            })?;

        info!(application_id = %application.id, job_id = %job_id, talent_id = %auth.id, "application submitted");
        self.audit.record(
            AuditEvent::new("application.submitted", "application", application.id)
                .actor(auth.id)
                .detail("job_id", job_id),
        );
        Ok(application)
    }

    pub fn applications_for_job(
        &self,
        auth: &AuthUser,
        job_id: JobId,
    ) -> Result<Vec<JobApplication>, ServiceError> {
        self.owned(auth, job_id)?;
        Ok(self.applications.for_job(job_id)?)
    }

    pub fn my_applications(&self, auth: &AuthUser) -> Result<Vec<JobApplication>, ServiceError> {
        auth.require(Role::Talent)?;
        Ok(self.applications.for_talent(auth.id)?)
    }

    /// Agency decision on an application to one of its jobs.
    pub fn set_application_status(
        &self,
        auth: &AuthUser,
        id: ApplicationId,
        update: StatusUpdate,
    ) -> Result<JobApplication, ServiceError> {
        let mut application = self.load_application(id)?;
        self.owned(auth, application.job_id)?;

        let previous = application.status;
        if !previous.agency_can_move_to(update.status) {
            warn!(application_id = %id, from = previous.as_str(), to = update.status.as_str(), "application transition refused");
            return Err(ServiceError::conflict(format!(
                "cannot move application from {} to {}",
                previous.as_str(),
                update.status.as_str()
            )));
        }

        application.status = update.status;
        application.updated_at = self.clock.now();
        self.applications.update(application.clone())?;

        self.audit.record(
            AuditEvent::new("application.status_changed", "application", id)
                .actor(auth.id)
                .detail("from", previous.as_str())
                .detail("to", update.status.as_str()),
        );
        Ok(application)
    }

    pub fn withdraw(
        &self,
        auth: &AuthUser,
        id: ApplicationId,
    ) -> Result<JobApplication, ServiceError> {
        auth.require(Role::Talent)?;
        let mut application = self.load_application(id)?;
        if application.talent_id != auth.id {
            return Err(ServiceError::forbidden(
                "only the applicant can withdraw this application",
            ));
        }
        if !application.status.can_withdraw() {
            return Err(ServiceError::conflict(format!(
                "cannot withdraw an application that is {}",
                application.status.as_str()
            )));
        }

        application.status = ApplicationStatus::Withdrawn;
        application.updated_at = self.clock.now();
        self.applications.update(application.clone())?;

        self.audit.record(
            AuditEvent::new("application.withdrawn", "application", id).actor(auth.id),
        );
        Ok(application)
    }

    pub fn export_applications_csv(
        &self,
        auth: &AuthUser,
        job_id: JobId,
    ) -> Result<String, ServiceError> {
        self.owned(auth, job_id)?;
        let rows = self
            .applications
            .for_job(job_id)?
            .into_iter()
            .map(|application| {
                let profile = self.profiles.talent(application.talent_id)?;
                Ok((application, profile))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let csv = applications_csv(&rows)?;
        self.audit.record(
            AuditEvent::new("job.applications_exported", "job", job_id)
                .actor(auth.id)
                .detail("rows", rows.len()),
        );
        Ok(csv)
    }

    fn load(&self, id: JobId) -> Result<JobPost, ServiceError> {
        self.jobs.fetch(id)?.ok_or(ServiceError::NotFound("job"))
    }

    fn load_application(&self, id: ApplicationId) -> Result<JobApplication, ServiceError> {
        self.applications
            .fetch(id)?
            .ok_or(ServiceError::NotFound("application"))
    }

    fn owned(&self, auth: &AuthUser, id: JobId) -> Result<JobPost, ServiceError> {
        auth.require(Role::Agency)?;
        let job = self.load(id)?;
        if job.agency_id != auth.id {
            return Err(ServiceError::forbidden("job belongs to another agency"));
        }
        Ok(job)
    }
}
