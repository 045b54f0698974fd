use crate::audit::ConsentRecord;
use crate::error::RepositoryError;
use crate::ids::UserId;
use crate::users::{User, UserRepository};

use super::MemoryStore;

impl UserRepository for MemoryStore {
    fn insert_with_consents(
        &self,
        user: User,
        consents: Vec<ConsentRecord>,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict("email"));
        }
        tables.users.insert(user.id, user.clone());
        tables.consents.extend(consents);
        Ok(user)
    }

    fn update(&self, user: User) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables
            .users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(RepositoryError::Conflict("email"));
        }
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|user| {
                user.verification
                    .as_ref()
                    .map(|pending| pending.token == token)
                    .unwrap_or(false)
            })
            .cloned())
    }
}
