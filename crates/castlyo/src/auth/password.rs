use base64::{engine::general_purpose, Engine as _};
use constant_time_eq::constant_time_eq;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::ServiceError;

const ALGORITHM: &str = "pbkdf2_sha256";
const HASH_LEN: usize = 32;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// PBKDF2-SHA256 hashes stored as `pbkdf2_sha256$<iterations>$<salt>$<base64>`.
///
/// The iteration count travels with every hash, so raising the cost only
/// affects newly hashed passwords.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let digest = derive(password, &salt, self.iterations);
        format!("{ALGORITHM}${}${salt}${digest}", self.iterations)
    }

    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let parts: Vec<&str> = encoded.split('$').collect();
        if parts.len() != 4 || parts[0] != ALGORITHM {
            return false;
        }

        let iterations: u32 = match parts[1].parse() {
            Ok(value) if value > 0 => value,
            _ => return false,
        };

        let computed = derive(password, parts[2], iterations);
        constant_time_eq(computed.as_bytes(), parts[3].as_bytes())
    }
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut output = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut output);
    general_purpose::STANDARD.encode(output)
}

/// Password policy shared by registration and password changes.
pub fn validate_password(password: &str) -> Result<(), ServiceError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if length > MAX_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ServiceError::validation(
            "password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}
