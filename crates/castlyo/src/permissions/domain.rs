use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{PermissionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionStatus {
    Pending,
    Granted,
    Denied,
    Revoked,
}

impl PermissionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Granted => "GRANTED",
            Self::Denied => "DENIED",
            Self::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionAction {
    Request,
    Grant,
    Deny,
    Revoke,
}

impl PermissionAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Grant => "grant",
            Self::Deny => "deny",
            Self::Revoke => "revoke",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Option<PermissionStatus>,
    pub action: PermissionAction,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.from.map(PermissionStatus::as_str).unwrap_or("absent");
        write!(
            f,
            "cannot {} a contact permission that is {state}",
            self.action.as_str()
        )
    }
}

impl std::error::Error for InvalidTransition {}

/// Contact permission state machine.
///
/// An agency may (re)request when nothing exists yet or after a denial or a
/// revocation. Only a pending request can be granted or denied, and only a
/// granted permission can be revoked.
pub fn transition(
    from: Option<PermissionStatus>,
    action: PermissionAction,
) -> Result<PermissionStatus, InvalidTransition> {
    use PermissionAction as A;
    use PermissionStatus as S;

    match (from, action) {
        (None | Some(S::Denied) | Some(S::Revoked), A::Request) => Ok(S::Pending),
        (Some(S::Pending), A::Grant) => Ok(S::Granted),
        (Some(S::Pending), A::Deny) => Ok(S::Denied),
        (Some(S::Granted), A::Revoke) => Ok(S::Revoked),
        _ => Err(InvalidTransition { from, action }),
    }
}

/// Row of `contact_permissions`; unique per (agency, talent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPermission {
    pub id: PermissionId,
    pub agency_id: UserId,
    pub talent_id: UserId,
    pub status: PermissionStatus,
    pub message: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ContactPermission {
    pub fn is_granted(&self) -> bool {
        self.status == PermissionStatus::Granted
    }
}
