use chrono::{DateTime, Utc};

use crate::billing::{
    BillingRepository, ConsumeOutcome, Entitlement, EntitlementKind, Subscription,
    SubscriptionStatus,
};
use crate::error::RepositoryError;
use crate::ids::UserId;

use super::MemoryStore;

impl BillingRepository for MemoryStore {
    fn active_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self
            .tables()?
            .subscriptions
            .values()
            .find(|subscription| {
                subscription.user_id == user_id
                    && subscription.status == SubscriptionStatus::Active
            })
            .cloned())
    }

    fn save_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError> {
        self.tables()?
            .subscriptions
            .insert(subscription.id, subscription);
        Ok(())
    }

    fn entitlements(&self, user_id: UserId) -> Result<Vec<Entitlement>, RepositoryError> {
        Ok(self
            .tables()?
            .entitlements
            .iter()
            .filter(|((owner, _), _)| *owner == user_id)
            .map(|(_, entitlement)| entitlement.clone())
            .collect())
    }

    fn reset_entitlements(
        &self,
        user_id: UserId,
        entitlements: Vec<Entitlement>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        tables.entitlements.retain(|(owner, _), _| *owner != user_id);
        for entitlement in entitlements {
            tables
                .entitlements
                .insert((user_id, entitlement.kind), entitlement);
        }
        Ok(())
    }

    fn consume(
        &self,
        user_id: UserId,
        kind: EntitlementKind,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, RepositoryError> {
        let mut tables = self.tables()?;
        let Some(entitlement) = tables.entitlements.get_mut(&(user_id, kind)) else {
            return Ok(ConsumeOutcome::Insufficient { available: 0 });
        };
        if entitlement.balance < amount {
            return Ok(ConsumeOutcome::Insufficient {
                available: entitlement.balance,
            });
        }
        entitlement.balance -= amount;
        entitlement.updated_at = at;
        Ok(ConsumeOutcome::Consumed {
            remaining: entitlement.balance,
        })
    }

    fn credit(
        &self,
        user_id: UserId,
        kind: EntitlementKind,
        amount: i64,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let entitlement = tables
            .entitlements
            .entry((user_id, kind))
            .or_insert_with(|| Entitlement {
                user_id,
                kind,
                balance: 0,
                granted: 0,
                updated_at: at,
            });
        entitlement.balance += amount;
        entitlement.updated_at = at;
        Ok(())
    }
}
