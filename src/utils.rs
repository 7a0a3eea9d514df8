use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::errors::AppError;

const MIN_PASSWORD_LEN: usize = 12;
const MAX_PASSWORD_LEN: usize = 128;
const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;':\",.<>?/";

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            AppError::PasswordError(e.to_string())
        })
}

/// `Ok(false)` on mismatch, `Err` only when the stored hash is malformed.
pub fn verify_password(provided: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AppError::PasswordError(format!("invalid hash format: {e}")))?;
    match Argon2::default().verify_password(provided.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::PasswordError(e.to_string())),
    }
}

/// Lower-cases the address and rejects anything without an `@`.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    Ok(email.to_lowercase())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if length > MAX_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters long"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_alphabetic())
        || !password.chars().any(|c| SPECIAL_CHARS.contains(c))
    {
        return Err(AppError::BadRequest(
            "Password must contain at least one number, one letter and one special character"
                .into(),
        ));
    }
    Ok(())
}
