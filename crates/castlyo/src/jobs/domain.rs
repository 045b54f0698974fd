use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::ids::{ApplicationId, JobId, UserId};
use crate::page::PageRequest;
use crate::profiles::Gender;

const MAX_TITLE_LEN: usize = 120;
const MAX_DESCRIPTION_LEN: usize = 5_000;
pub const MAX_COVER_LETTER_LEN: usize = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobCategory {
    Film,
    Television,
    Commercial,
    Theatre,
    Modeling,
    MusicVideo,
    Voice,
    Other,
}

impl JobCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Film => "film",
            Self::Television => "television",
            Self::Commercial => "commercial",
            Self::Theatre => "theatre",
            Self::Modeling => "modeling",
            Self::MusicVideo => "music-video",
            Self::Voice => "voice",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Open,
    Closed,
}

/// Row of `job_posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPost {
    pub id: JobId,
    pub agency_id: UserId,
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub location: String,
    pub compensation: Option<String>,
    pub age_min: Option<u8>,
    pub age_max: Option<u8>,
    pub gender: Option<Gender>,
    pub deadline: Option<NaiveDate>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl JobPost {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }

    pub fn accepts_applications_on(&self, today: NaiveDate) -> bool {
        self.is_open() && self.deadline.map(|deadline| today <= deadline).unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJobPost {
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub location: String,
    #[serde(default)]
    pub compensation: Option<String>,
    #[serde(default)]
    pub age_min: Option<u8>,
    #[serde(default)]
    pub age_max: Option<u8>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl NewJobPost {
    pub fn validate(&self, today: NaiveDate) -> Result<(), ServiceError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        if self.location.trim().is_empty() {
            return Err(ServiceError::validation("location is required"));
        }
        validate_age_range(self.age_min, self.age_max)?;
        validate_deadline(self.deadline, today)
    }
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<JobCategory>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub compensation: Option<String>,
    #[serde(default)]
    pub age_min: Option<u8>,
    #[serde(default)]
    pub age_max: Option<u8>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

impl JobPatch {
    /// Apply onto `job` and validate the merged result.
    pub fn apply(self, job: &mut JobPost, today: NaiveDate) -> Result<(), ServiceError> {
        if let Some(title) = self.title {
            validate_title(&title)?;
            job.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            validate_description(&description)?;
            job.description = description.trim().to_string();
        }
        if let Some(category) = self.category {
            job.category = category;
        }
        if let Some(location) = self.location {
            if location.trim().is_empty() {
                return Err(ServiceError::validation("location is required"));
            }
            job.location = location.trim().to_string();
        }
        if let Some(compensation) = self.compensation {
            job.compensation = Some(compensation.trim().to_string()).filter(|c| !c.is_empty());
        }
        if self.age_min.is_some() {
            job.age_min = self.age_min;
        }
        if self.age_max.is_some() {
            job.age_max = self.age_max;
        }
        if self.gender.is_some() {
            job.gender = self.gender;
        }
        if self.deadline.is_some() {
            validate_deadline(self.deadline, today)?;
            job.deadline = self.deadline;
        }
        validate_age_range(job.age_min, job.age_max)
    }
}

fn validate_title(title: &str) -> Result<(), ServiceError> {
    let length = title.trim().chars().count();
    if length == 0 {
        return Err(ServiceError::validation("title is required"));
    }
    if length > MAX_TITLE_LEN {
        return Err(ServiceError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ServiceError> {
    let length = description.trim().chars().count();
    if length == 0 {
        return Err(ServiceError::validation("description is required"));
    }
    if length > MAX_DESCRIPTION_LEN {
        return Err(ServiceError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_age_range(min: Option<u8>, max: Option<u8>) -> Result<(), ServiceError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ServiceError::validation(
            "age_min must not exceed age_max",
        )),
        _ => Ok(()),
    }
}

fn validate_deadline(deadline: Option<NaiveDate>, today: NaiveDate) -> Result<(), ServiceError> {
    match deadline {
        Some(deadline) if deadline < today => {
            Err(ServiceError::validation("deadline cannot be in the past"))
        }
        _ => Ok(()),
    }
}

/// Query parameters for the public job listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub category: Option<JobCategory>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub agency_id: Option<UserId>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl JobFilter {
    pub fn page(&self) -> PageRequest {
        PageRequest {
            limit: self.limit,
            offset: self.offset,
        }
    }

    pub fn matches(&self, job: &JobPost) -> bool {
        if let Some(category) = self.category {
            if job.category != category {
                return false;
            }
        }
        if let Some(agency) = self.agency_id {
            if job.agency_id != agency {
                return false;
            }
        }
        match self.location.as_deref().map(str::trim) {
            Some(wanted) if !wanted.is_empty() => job
                .location
                .to_lowercase()
                .contains(&wanted.to_lowercase()),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    Shortlisted,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Shortlisted => "SHORTLISTED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Withdrawn => "WITHDRAWN",
        }
    }

    /// Decisions an agency may take from this state.
    pub fn agency_can_move_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Shortlisted)
                | (Self::Submitted, Self::Accepted)
                | (Self::Submitted, Self::Rejected)
                | (Self::Shortlisted, Self::Accepted)
                | (Self::Shortlisted, Self::Rejected)
        )
    }

    pub fn can_withdraw(self) -> bool {
        matches!(self, Self::Submitted | Self::Shortlisted)
    }
}

/// Row of `job_applications`; unique per (job, talent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub talent_id: UserId,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
