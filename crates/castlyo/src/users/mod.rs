//! Accounts: the `users` table, account self-service and consent history.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{AccountStatus, EmailVerification, Role, User, UserView};
pub use repository::UserRepository;
pub use router::users_router;
pub use service::{ChangePassword, MarketingConsent, UpdateAccount, UserService};
