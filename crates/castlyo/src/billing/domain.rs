use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SubscriptionId, UserId};
use crate::users::Role;

/// Countable quota granted by a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntitlementKind {
    JobPost,
    ContactRequest,
    FeaturedProfile,
}

impl EntitlementKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JobPost => "JOB_POST",
            Self::ContactRequest => "CONTACT_REQUEST",
            Self::FeaturedProfile => "FEATURED_PROFILE",
        }
    }
}

impl fmt::Display for EntitlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    pub fn period(self) -> Duration {
        match self {
            Self::Monthly => Duration::days(30),
            Self::Yearly => Duration::days(365),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanQuota {
    pub kind: EntitlementKind,
    pub quota: i64,
}

/// Row of `subscription_plans`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub code: String,
    pub name: String,
    pub audience: Role,
    pub price_cents: u32,
    pub currency: String,
    pub interval: BillingInterval,
    pub quotas: Vec<PlanQuota>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
}

/// Row of `user_subscriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_code: String,
    pub status: SubscriptionStatus,
    pub started_at: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

/// Row of `user_entitlements`: remaining balance of one quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub user_id: UserId,
    pub kind: EntitlementKind,
    pub balance: i64,
    pub granted: i64,
    pub updated_at: DateTime<Utc>,
}
