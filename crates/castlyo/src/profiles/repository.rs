use crate::error::RepositoryError;
use crate::ids::UserId;

use super::domain::{AgencyProfile, TalentProfile};

pub trait ProfileRepository: Send + Sync {
    fn save_talent(&self, profile: TalentProfile) -> Result<(), RepositoryError>;
    fn talent(&self, user_id: UserId) -> Result<Option<TalentProfile>, RepositoryError>;
    fn save_agency(&self, profile: AgencyProfile) -> Result<(), RepositoryError>;
    fn agency(&self, user_id: UserId) -> Result<Option<AgencyProfile>, RepositoryError>;
}
