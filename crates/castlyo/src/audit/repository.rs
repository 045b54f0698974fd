use crate::error::RepositoryError;
use crate::ids::UserId;

use super::domain::{AuditEntry, ConsentRecord};

pub trait AuditRepository: Send + Sync {
    fn append_audit(&self, entry: AuditEntry) -> Result<(), RepositoryError>;
    fn append_consent(&self, record: ConsentRecord) -> Result<(), RepositoryError>;
    fn audits_for_subject(
        &self,
        subject_type: &str,
        subject_id: &str,
    ) -> Result<Vec<AuditEntry>, RepositoryError>;
    /// Oldest first.
    fn consents_for_user(&self, user_id: UserId) -> Result<Vec<ConsentRecord>, RepositoryError>;
}
