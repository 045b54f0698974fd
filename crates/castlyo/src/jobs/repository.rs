use crate::error::RepositoryError;
use crate::ids::{ApplicationId, JobId, UserId};

use super::domain::{JobApplication, JobPost};

pub trait JobRepository: Send + Sync {
    fn insert(&self, job: JobPost) -> Result<JobPost, RepositoryError>;
    fn update(&self, job: JobPost) -> Result<(), RepositoryError>;
    fn fetch(&self, id: JobId) -> Result<Option<JobPost>, RepositoryError>;
    /// Every job, newest first; filtering happens in the service.
    fn all(&self) -> Result<Vec<JobPost>, RepositoryError>;
    fn by_agency(&self, agency_id: UserId) -> Result<Vec<JobPost>, RepositoryError>;
}

pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict("application")` when the talent already applied.
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError>;
    fn update(&self, application: JobApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: ApplicationId) -> Result<Option<JobApplication>, RepositoryError>;
    fn for_job(&self, job_id: JobId) -> Result<Vec<JobApplication>, RepositoryError>;
    fn for_talent(&self, talent_id: UserId) -> Result<Vec<JobApplication>, RepositoryError>;
}
