use chrono::{DateTime, Utc};

use crate::error::RepositoryError;
use crate::ids::UserId;

use super::domain::{Entitlement, EntitlementKind, Subscription};

/// Result of an atomic check-and-decrement on a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed { remaining: i64 },
    Insufficient { available: i64 },
}

pub trait BillingRepository: Send + Sync {
    fn active_subscription(&self, user_id: UserId)
        -> Result<Option<Subscription>, RepositoryError>;
    fn save_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError>;
    fn entitlements(&self, user_id: UserId) -> Result<Vec<Entitlement>, RepositoryError>;
    /// Replace every balance the user holds with `entitlements`.
    fn reset_entitlements(
        &self,
        user_id: UserId,
        entitlements: Vec<Entitlement>,
    ) -> Result<(), RepositoryError>;
    /// Decrement the balance only when it covers `amount`; the check and the
    /// write happen under one lock.
    fn consume(
        &self,
        user_id: UserId,
        kind: EntitlementKind,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, RepositoryError>;
    fn credit(
        &self,
        user_id: UserId,
        kind: EntitlementKind,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}
