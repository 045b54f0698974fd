use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AuditId, ConsentId, UserId};

/// Row of the `audit_logs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub actor: Option<UserId>,
    pub action: String,
    pub subject_type: String,
    pub subject_id: String,
    pub detail: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentKind {
    TermsOfService,
    PrivacyPolicy,
    Marketing,
    /// Talent decision on sharing contact details with one agency.
    ContactSharing,
}

/// Row of the `consent_logs` table. Rows are never updated; the latest row
/// per (kind, subject) is the effective decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: ConsentId,
    pub user_id: UserId,
    pub kind: ConsentKind,
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<UserId>,
    pub recorded_at: DateTime<Utc>,
}

impl ConsentRecord {
    pub fn new(
        user_id: UserId,
        kind: ConsentKind,
        granted: bool,
        subject: Option<UserId>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ConsentId::generate(),
            user_id,
            kind,
            granted,
            subject,
            recorded_at,
        }
    }
}
