//! Talent and agency profiles, one per user.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    AgencyProfile, AgencyProfileInput, ContactDetails, Gender, TalentProfile, TalentProfileInput,
    TalentProfileView, Visibility,
};
pub use repository::ProfileRepository;
pub use router::profiles_router;
pub use service::ProfileService;
