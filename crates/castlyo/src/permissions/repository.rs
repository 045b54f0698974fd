use crate::error::RepositoryError;
use crate::ids::{PermissionId, UserId};

use super::domain::{ContactPermission, PermissionStatus};

pub trait PermissionRepository: Send + Sync {
    /// Insert or replace; the (agency, talent) pair stays unique.
    fn save(&self, permission: ContactPermission) -> Result<(), RepositoryError>;
    fn fetch(&self, id: PermissionId) -> Result<Option<ContactPermission>, RepositoryError>;
    fn find(
        &self,
        agency_id: UserId,
        talent_id: UserId,
    ) -> Result<Option<ContactPermission>, RepositoryError>;
    fn for_talent(
        &self,
        talent_id: UserId,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, RepositoryError>;
    fn for_agency(
        &self,
        agency_id: UserId,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, RepositoryError>;
}
