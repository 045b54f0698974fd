use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{AuditEvent, AuditTrail};
use crate::auth::AuthUser;
use crate::clock::Clock;
use crate::error::ServiceError;
use crate::ids::{SubscriptionId, UserId};

use super::catalog::PlanCatalog;
use super::domain::{
    Entitlement, EntitlementKind, Subscription, SubscriptionPlan, SubscriptionStatus,
};
use super::repository::{BillingRepository, ConsumeOutcome};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub plan_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionView {
    pub subscription: Subscription,
    pub plan: SubscriptionPlan,
    pub entitlements: Vec<Entitlement>,
}

/// Plans, subscriptions and the entitlement ledger other services draw from.
pub struct BillingService {
    repository: Arc<dyn BillingRepository>,
    catalog: Arc<PlanCatalog>,
    audit: AuditTrail,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    pub fn new(
        repository: Arc<dyn BillingRepository>,
        catalog: Arc<PlanCatalog>,
        audit: AuditTrail,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            catalog,
            audit,
            clock,
        }
    }

    pub fn plans(&self) -> Vec<SubscriptionPlan> {
        self.catalog.plans().to_vec()
    }

    /// Activate `plan_code` for the caller. A different active plan is
    /// canceled first; balances are replaced by the new plan's quotas.
    pub fn subscribe(
        &self,
        auth: &AuthUser,
        request: SubscribeRequest,
    ) -> Result<SubscriptionView, ServiceError> {
        let plan = self
            .catalog
            .find(&request.plan_code)
            .cloned()
            .ok_or(ServiceError::NotFound("plan"))?;

        if plan.audience != auth.role {
            return Err(ServiceError::forbidden(format!(
                "plan {} is only available to {} accounts",
                plan.code, plan.audience
            )));
        }

        let now = self.clock.now();
        if let Some(mut current) = self.repository.active_subscription(auth.id)? {
            if current.plan_code == plan.code {
                return Err(ServiceError::conflict(format!(
                    "already subscribed to {}",
                    plan.code
                )));
            }
            current.status = SubscriptionStatus::Canceled;
            current.canceled_at = Some(now);
            self.repository.save_subscription(current.clone())?;
            info!(user_id = %auth.id, from = %current.plan_code, to = %plan.code, "plan switched");
        }

        let subscription = Subscription {
            id: SubscriptionId::generate(),
            user_id: auth.id,
            plan_code: plan.code.clone(),
            status: SubscriptionStatus::Active,
            started_at: now,
            current_period_end: now + plan.interval.period(),
            canceled_at: None,
        };
        self.repository.save_subscription(subscription.clone())?;

        let entitlements: Vec<Entitlement> = plan
            .quotas
            .iter()
            .map(|quota| Entitlement {
                user_id: auth.id,
                kind: quota.kind,
                balance: quota.quota,
                granted: quota.quota,
                updated_at: now,
            })
            .collect();
        self.repository
            .reset_entitlements(auth.id, entitlements.clone())?;

        info!(user_id = %auth.id, plan = %plan.code, "subscription activated");
        self.audit.record(
            AuditEvent::new("subscription.activated", "subscription", subscription.id)
                .actor(auth.id)
                .detail("plan", &plan.code),
        );

        Ok(SubscriptionView {
            subscription,
            plan,
            entitlements,
        })
    }

    pub fn current(&self, auth: &AuthUser) -> Result<SubscriptionView, ServiceError> {
        let subscription = self
            .repository
            .active_subscription(auth.id)?
            .ok_or(ServiceError::NotFound("active subscription"))?;
        let plan = self
            .catalog
            .find(&subscription.plan_code)
            .cloned()
            .ok_or(ServiceError::NotFound("plan"))?;
        let entitlements = self.repository.entitlements(auth.id)?;

        Ok(SubscriptionView {
            subscription,
            plan,
            entitlements,
        })
    }

    /// Cancel immediately; remaining balances drop to zero.
    pub fn cancel(&self, auth: &AuthUser) -> Result<Subscription, ServiceError> {
        let mut subscription = self
            .repository
            .active_subscription(auth.id)?
            .ok_or(ServiceError::NotFound("active subscription"))?;

        let now = self.clock.now();
        subscription.status = SubscriptionStatus::Canceled;
        subscription.canceled_at = Some(now);
        self.repository.save_subscription(subscription.clone())?;

        let zeroed = self
            .repository
            .entitlements(auth.id)?
            .into_iter()
            .map(|entitlement| Entitlement {
                balance: 0,
                updated_at: now,
                ..entitlement
            })
            .collect();
        self.repository.reset_entitlements(auth.id, zeroed)?;

        info!(user_id = %auth.id, plan = %subscription.plan_code, "subscription canceled");
        self.audit.record(
            AuditEvent::new("subscription.canceled", "subscription", subscription.id)
                .actor(auth.id)
                .detail("plan", &subscription.plan_code),
        );
        Ok(subscription)
    }

    pub fn entitlements(&self, auth: &AuthUser) -> Result<Vec<Entitlement>, ServiceError> {
        Ok(self.repository.entitlements(auth.id)?)
    }

    pub fn balance(&self, user_id: UserId, kind: EntitlementKind) -> Result<i64, ServiceError> {
        Ok(self
            .repository
            .entitlements(user_id)?
            .into_iter()
            .find(|entitlement| entitlement.kind == kind)
            .map(|entitlement| entitlement.balance)
            .unwrap_or(0))
    }

    /// Draw `amount` from the user's balance, refusing when it would go negative.
    pub fn consume(
        &self,
        user_id: UserId,
        kind: EntitlementKind,
        amount: i64,
    ) -> Result<i64, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::validation("amount must be positive"));
        }

        match self
            .repository
            .consume(user_id, kind, amount, self.clock.now())?
        {
            ConsumeOutcome::Consumed { remaining } => {
                self.audit.record(
                    AuditEvent::new("entitlement.consumed", "user", user_id)
                        .actor(user_id)
                        .detail("kind", kind)
                        .detail("amount", amount)
                        .detail("remaining", remaining),
                );
                Ok(remaining)
            }
            ConsumeOutcome::Insufficient { available } => {
                warn!(user_id = %user_id, %kind, available, "entitlement exhausted");
                Err(ServiceError::InsufficientEntitlement {
                    kind,
                    required: amount,
                    available,
                })
            }
        }
    }

    /// Give back a unit drawn for an operation that did not complete.
    pub fn restore(&self, user_id: UserId, kind: EntitlementKind, amount: i64) {
        if let Err(err) = self
            .repository
            .credit(user_id, kind, amount, self.clock.now())
        {
            warn!(user_id = %user_id, %kind, error = %err, "failed to restore entitlement");
        }
    }
}
