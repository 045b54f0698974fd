use crate::error::RepositoryError;
use crate::ids::{ApplicationId, JobId, UserId};
use crate::jobs::{ApplicationRepository, JobApplication, JobPost, JobRepository};

use super::MemoryStore;

fn newest_first(mut jobs: Vec<JobPost>) -> Vec<JobPost> {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    jobs
}

fn oldest_first(mut applications: Vec<JobApplication>) -> Vec<JobApplication> {
    applications.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    applications
}

impl JobRepository for MemoryStore {
    fn insert(&self, job: JobPost) -> Result<JobPost, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::Conflict("job"));
        }
        tables.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn update(&self, job: JobPost) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.jobs.get_mut(&job.id) {
            Some(slot) => {
                *slot = job;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: JobId) -> Result<Option<JobPost>, RepositoryError> {
        Ok(self.tables()?.jobs.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<JobPost>, RepositoryError> {
        Ok(newest_first(self.tables()?.jobs.values().cloned().collect()))
    }

    fn by_agency(&self, agency_id: UserId) -> Result<Vec<JobPost>, RepositoryError> {
        Ok(newest_first(
            self.tables()?
                .jobs
                .values()
                .filter(|job| job.agency_id == agency_id)
                .cloned()
                .collect(),
        ))
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert(&self, application: JobApplication) -> Result<JobApplication, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.applications.values().any(|existing| {
            existing.job_id == application.job_id && existing.talent_id == application.talent_id
        }) {
            return Err(RepositoryError::Conflict("application"));
        }
        tables
            .applications
            .insert(application.id, application.clone());
        Ok(application)
    }

    fn update(&self, application: JobApplication) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.applications.get_mut(&application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: ApplicationId) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(self.tables()?.applications.get(&id).cloned())
    }

    fn for_job(&self, job_id: JobId) -> Result<Vec<JobApplication>, RepositoryError> {
        Ok(oldest_first(
            self.tables()?
                .applications
                .values()
                .filter(|application| application.job_id == job_id)
                .cloned()
                .collect(),
        ))
    }

    fn for_talent(&self, talent_id: UserId) -> Result<Vec<JobApplication>, RepositoryError> {
        Ok(oldest_first(
            self.tables()?
                .applications
                .values()
                .filter(|application| application.talent_id == talent_id)
                .cloned()
                .collect(),
        ))
    }
}
