//! Registration, email verification, login and request authentication.

pub mod extract;
pub mod mailer;
pub mod password;
pub mod router;
pub mod service;
pub mod token;


pub use extract::{AuthUser, Authenticator};
pub use mailer::{MailError, Mailer, MemoryMailer, OutboundEmail};
pub use password::PasswordHasher;
pub use router::auth_router;
pub use service::{
    AuthService, LoginRequest, RegisterRequest, RegistrationView, ResendVerificationRequest,
    TokenResponse, VerifyEmailRequest,
};
pub use token::{Claims, IssuedToken, TokenIssuer};
