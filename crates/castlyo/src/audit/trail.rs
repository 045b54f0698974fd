use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::clock::Clock;
use crate::error::RepositoryError;
use crate::ids::{AuditId, UserId};

use super::domain::{AuditEntry, ConsentKind, ConsentRecord};
use super::repository::AuditRepository;

/// Builder for a single audit row.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    action: &'static str,
    subject_type: &'static str,
    subject_id: String,
    actor: Option<UserId>,
    detail: BTreeMap<String, String>,
}

impl AuditEvent {
    pub fn new(action: &'static str, subject_type: &'static str, subject_id: impl ToString) -> Self {
        Self {
            action,
            subject_type,
            subject_id: subject_id.to_string(),
            actor: None,
            detail: BTreeMap::new(),
        }
    }

    pub fn actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn detail(mut self, key: &str, value: impl ToString) -> Self {
        self.detail.insert(key.to_string(), value.to_string());
        self
    }
}

/// Writes audit and consent rows on behalf of the services.
///
/// Audit writes are best effort: a failure is logged and the business
/// operation that triggered it still succeeds.
#[derive(Clone)]
pub struct AuditTrail {
    repository: Arc<dyn AuditRepository>,
    clock: Arc<dyn Clock>,
}

impl AuditTrail {
    pub fn new(repository: Arc<dyn AuditRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn record(&self, event: AuditEvent) {
        let entry = AuditEntry {
            id: AuditId::generate(),
            actor: event.actor,
            action: event.action.to_string(),
            subject_type: event.subject_type.to_string(),
            subject_id: event.subject_id,
            detail: event.detail,
            recorded_at: self.clock.now(),
        };

        if let Err(err) = self.repository.append_audit(entry) {
            warn!(action = event.action, error = %err, "failed to write audit entry");
        }
    }

    /// Consent rows are part of the decision itself, so failures propagate.
    pub fn consent(
        &self,
        user_id: UserId,
        kind: ConsentKind,
        granted: bool,
        subject: Option<UserId>,
    ) -> Result<ConsentRecord, RepositoryError> {
        let record = ConsentRecord::new(user_id, kind, granted, subject, self.clock.now());
        self.repository.append_consent(record.clone())?;
        Ok(record)
    }

    pub fn consents_for(&self, user_id: UserId) -> Result<Vec<ConsentRecord>, RepositoryError> {
        self.repository.consents_for_user(user_id)
    }

    pub fn history(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> Result<Vec<AuditEntry>, RepositoryError> {
        self.repository.audits_for_subject(subject_type, subject_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn trail() -> (AuditTrail, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("valid instant"),
        ));
        (AuditTrail::new(store.clone(), clock), store)
    }

    #[test]
    fn records_events_with_detail() {
        let (trail, store) = trail();
        let actor = UserId::generate();
        trail.record(
            AuditEvent::new("job.created", "job", "job-1")
                .actor(actor)
                .detail("title", "Lead role"),
        );

        let history = store
            .audits_for_subject("job", "job-1")
            .expect("history loads");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "job.created");
        assert_eq!(history[0].actor, Some(actor));
        assert_eq!(history[0].detail.get("title").map(String::as_str), Some("Lead role"));
    }

    #[test]
    fn consent_rows_accumulate_in_order() {
        let (trail, _) = trail();
        let user = UserId::generate();
        trail
            .consent(user, ConsentKind::Marketing, true, None)
            .expect("consent stored");
        trail
            .consent(user, ConsentKind::Marketing, false, None)
            .expect("consent stored");

        let rows = trail.consents_for(user).expect("consents load");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].granted);
        assert!(!rows[1].granted);
    }
}
