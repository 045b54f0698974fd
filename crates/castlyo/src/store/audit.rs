use crate::audit::{AuditEntry, AuditRepository, ConsentRecord};
use crate::error::RepositoryError;
use crate::ids::UserId;

use super::MemoryStore;

impl AuditRepository for MemoryStore {
    fn append_audit(&self, entry: AuditEntry) -> Result<(), RepositoryError> {
        self.tables()?.audits.push(entry);
        Ok(())
    }

    fn append_consent(&self, record: ConsentRecord) -> Result<(), RepositoryError> {
        self.tables()?.consents.push(record);
        Ok(())
    }

    fn audits_for_subject(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> Result<Vec<AuditEntry>, RepositoryError> {
        Ok(self
            .tables()?
            .audits
            .iter()
            .filter(|entry| entry.subject_type == subject_type && entry.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn consents_for_user(&self, user_id: UserId) -> Result<Vec<ConsentRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .consents
            .iter()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }
}
