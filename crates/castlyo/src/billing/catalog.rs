use crate::users::Role;

use super::domain::{BillingInterval, EntitlementKind, PlanQuota, SubscriptionPlan};

/// Plans offered to each side of the marketplace.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<SubscriptionPlan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<SubscriptionPlan>) -> Self {
        Self { plans }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            plan("TALENT_FREE", "Talent Free", Role::Talent, 0, &[]),
            plan(
                "TALENT_PRO",
                "Talent Pro",
                Role::Talent,
                1_499,
                &[(EntitlementKind::FeaturedProfile, 1)],
            ),
            plan(
                "AGENCY_FREE",
                "Agency Starter",
                Role::Agency,
                0,
                &[
                    (EntitlementKind::JobPost, 1),
                    (EntitlementKind::ContactRequest, 3),
                ],
            ),
            plan(
                "AGENCY_PRO",
                "Agency Pro",
                Role::Agency,
                9_900,
                &[
                    (EntitlementKind::JobPost, 20),
                    (EntitlementKind::ContactRequest, 100),
                ],
            ),
            plan(
                "AGENCY_ENTERPRISE",
                "Agency Enterprise",
                Role::Agency,
                29_900,
                &[
                    (EntitlementKind::JobPost, 200),
                    (EntitlementKind::ContactRequest, 1_000),
                ],
            ),
        ])
    }

    pub fn plans(&self) -> &[SubscriptionPlan] {
        &self.plans
    }

    pub fn find(&self, code: &str) -> Option<&SubscriptionPlan> {
        let code = code.trim();
        self.plans
            .iter()
            .find(|plan| plan.code.eq_ignore_ascii_case(code))
    }

    pub fn for_role(&self, role: Role) -> Vec<&SubscriptionPlan> {
        self.plans
            .iter()
            .filter(|plan| plan.audience == role)
            .collect()
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn plan(
    code: &str,
    name: &str,
    audience: Role,
    price_cents: u32,
    quotas: &[(EntitlementKind, i64)],
) -> SubscriptionPlan {
    SubscriptionPlan {
        code: code.to_string(),
        name: name.to_string(),
        audience,
        price_cents,
        currency: "EUR".to_string(),
        interval: BillingInterval::Monthly,
        quotas: quotas
            .iter()
            .map(|&(kind, quota)| PlanQuota { kind, quota })
            .collect(),
    }
}
