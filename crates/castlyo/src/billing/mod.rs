//! Subscription plans, user subscriptions and entitlement quotas.

pub mod catalog;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use catalog::PlanCatalog;
pub use domain::{
    BillingInterval, Entitlement, EntitlementKind, PlanQuota, Subscription, SubscriptionPlan,
    SubscriptionStatus,
};
pub use repository::{BillingRepository, ConsumeOutcome};
pub use router::billing_router;
pub use service::{BillingService, SubscribeRequest, SubscriptionView};
