//! Casting marketplace backend: talents, agencies, jobs, consent-gated
//! contact and subscription entitlements behind an axum REST API.

pub mod app;
pub mod audit;
pub mod auth;
pub mod billing;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod ids;
pub mod jobs;
pub mod messages;
pub mod page;
pub mod permissions;
pub mod profiles;
pub mod search;
pub mod store;
pub mod telemetry;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{router, AppDependencies, AppServices, Repositories};
pub use error::{AppError, RepositoryError, ServiceError};
