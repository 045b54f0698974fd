//! Consent-gated contact permissions between agencies and talents.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    transition, ContactPermission, InvalidTransition, PermissionAction, PermissionStatus,
};
pub use repository::PermissionRepository;
pub use router::permissions_router;
pub use service::{ContactRequest, Decision, PermissionService, RespondRequest};
