use crate::error::RepositoryError;
use crate::ids::{PermissionId, UserId};
use crate::permissions::{ContactPermission, PermissionRepository, PermissionStatus};

use super::MemoryStore;

impl MemoryStore {
    fn permissions_where(
        &self,
        keep: impl Fn(&ContactPermission) -> bool,
    ) -> Result<Vec<ContactPermission>, RepositoryError> {
        let mut matching: Vec<ContactPermission> = self
            .tables()?
            .permissions
            .values()
            .filter(|permission| keep(permission))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(matching)
    }
}

impl PermissionRepository for MemoryStore {
    fn save(&self, permission: ContactPermission) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.permissions.values().any(|existing| {
            existing.id != permission.id
                && existing.agency_id == permission.agency_id
                && existing.talent_id == permission.talent_id
        }) {
            return Err(RepositoryError::Conflict("contact permission"));
        }
        tables.permissions.insert(permission.id, permission);
        Ok(())
    }

    fn fetch(&self, id: PermissionId) -> Result<Option<ContactPermission>, RepositoryError> {
        Ok(self.tables()?.permissions.get(&id).cloned())
    }

    fn find(
        &self,
        agency_id: UserId,
        talent_id: UserId,
    ) -> Result<Option<ContactPermission>, RepositoryError> {
        Ok(self
            .tables()?
            .permissions
            .values()
            .find(|permission| {
                permission.agency_id == agency_id && permission.talent_id == talent_id
            })
            .cloned())
    }

    fn for_talent(
        &self,
        talent_id: UserId,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, RepositoryError> {
        self.permissions_where(|permission| {
            permission.talent_id == talent_id
                && status.map(|wanted| permission.status == wanted).unwrap_or(true)
        })
    }

    fn for_agency(
        &self,
        agency_id: UserId,
        status: Option<PermissionStatus>,
    ) -> Result<Vec<ContactPermission>, RepositoryError> {
        self.permissions_where(|permission| {
            permission.agency_id == agency_id
                && status.map(|wanted| permission.status == wanted).unwrap_or(true)
        })
    }
}
