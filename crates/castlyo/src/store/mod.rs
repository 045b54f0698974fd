//! In-memory storage for every repository trait.
//!
//! All tables sit behind one mutex so multi-table writes (an account and its
//! consents, a balance check and its decrement) are atomic.

mod audit;
mod billing;
mod jobs;
mod messages;
mod permissions;
mod profiles;
mod users;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::audit::{AuditEntry, ConsentRecord};
use crate::billing::{Entitlement, EntitlementKind, Subscription};
use crate::error::RepositoryError;
use crate::ids::{ApplicationId, JobId, PermissionId, SubscriptionId, ThreadId, UserId};
use crate::jobs::{JobApplication, JobPost};
use crate::messages::{Message, MessageThread};
use crate::permissions::ContactPermission;
use crate::profiles::{AgencyProfile, TalentProfile};
use crate::users::User;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    consents: Vec<ConsentRecord>,
    audits: Vec<AuditEntry>,
    talents: HashMap<UserId, TalentProfile>,
    agencies: HashMap<UserId, AgencyProfile>,
    jobs: HashMap<JobId, JobPost>,
    applications: HashMap<ApplicationId, JobApplication>,
    permissions: HashMap<PermissionId, ContactPermission>,
    threads: HashMap<ThreadId, MessageThread>,
    messages: Vec<Message>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    entitlements: BTreeMap<(UserId, EntitlementKind), Entitlement>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}
