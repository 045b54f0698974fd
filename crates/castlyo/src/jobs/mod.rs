//! Job postings by agencies and applications by talents.

pub mod domain;
pub mod export;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationStatus, JobApplication, JobCategory, JobFilter, JobPatch, JobPost, JobStatus,
    NewJobPost,
};
pub use repository::{ApplicationRepository, JobRepository};
pub use router::jobs_router;
pub use service::{ApplyRequest, JobService, StatusUpdate};
