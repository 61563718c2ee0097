//! Argon2id password hashing.
//!
//! Hashing and verification are CPU-intensive and run in blocking tasks so
//! they never stall the async runtime.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password using Argon2id
pub async fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let password = password.to_string();

    let hash = tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("Failed to hash password: {}", e))
    })
    .await
    .context("Password hashing task panicked")??;

    Ok(hash)
}

/// Verify a password against its hash with constant-time comparison
pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();

    let result = tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&hash)
            .map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow!("Password verification error: {}", e)),
        }
    })
    .await
    .context("Password verification task panicked")??;

    Ok(result)
}

/// Validate password strength
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(anyhow!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_uppercase && has_lowercase && has_digit) {
        return Err(anyhow!(
            "Password must contain uppercase, lowercase and numeric characters"
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify_round_trip() {
        let hash = hash_password("Correct1Horse").await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Correct1Horse", &hash).await.unwrap());
        assert!(!verify_password("Wrong1Password", &hash).await.unwrap());
    }

    #[test]
    fn strength_rejects_short_passwords() {
        assert!(validate_password_strength("Ab1").is_err());
    }

    #[test]
    fn strength_requires_mixed_characters() {
        assert!(validate_password_strength("alllowercase1").is_err());
        assert!(validate_password_strength("ALLUPPERCASE1").is_err());
        assert!(validate_password_strength("NoDigitsHere").is_err());
        assert!(validate_password_strength("Valid1Password").is_ok());
    }
}
