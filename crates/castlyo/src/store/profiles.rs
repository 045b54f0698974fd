use crate::error::RepositoryError;
use crate::ids::UserId;
use crate::profiles::{AgencyProfile, ProfileRepository, TalentProfile};

use super::MemoryStore;

impl ProfileRepository for MemoryStore {
    fn save_talent(&self, profile: TalentProfile) -> Result<(), RepositoryError> {
        self.tables()?.talents.insert(profile.user_id, profile);
        Ok(())
    }

    fn talent(&self, user_id: UserId) -> Result<Option<TalentProfile>, RepositoryError> {
        Ok(self.tables()?.talents.get(&user_id).cloned())
    }

    fn save_agency(&self, profile: AgencyProfile) -> Result<(), RepositoryError> {
        self.tables()?.agencies.insert(profile.user_id, profile);
        Ok(())
    }

    fn agency(&self, user_id: UserId) -> Result<Option<AgencyProfile>, RepositoryError> {
        Ok(self.tables()?.agencies.get(&user_id).cloned())
    }
}
