use crate::audit::ConsentRecord;
use crate::error::RepositoryError;
use crate::ids::UserId;

use super::domain::User;

/// Storage abstraction for accounts.
pub trait UserRepository: Send + Sync {
    /// Insert the account together with its registration consents as one
    /// atomic write. Fails with `Conflict("email")` when the email is taken.
    fn insert_with_consents(
        &self,
        user: User,
        consents: Vec<ConsentRecord>,
    ) -> Result<User, RepositoryError>;
    fn update(&self, user: User) -> Result<(), RepositoryError>;
    fn fetch(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn find_by_verification_token(&self, token: &str) -> Result<Option<User>, RepositoryError>;
}
