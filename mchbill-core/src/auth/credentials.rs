/*
    credentials.rs - Password storage forms

    A stored credential is either the plaintext password or an Argon2id
    PHC string (`$argon2id$...`). Verification accepts both.
*/

use super::errors::{AuthError, AuthResult};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

const PHC_PREFIX: &str = "$argon2";

/// Produce the stored form of `password`
pub fn seal(password: &str, hash: bool) -> AuthResult<String> {
    if !hash {
        return Ok(password.to_string());
    }

    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with(PHC_PREFIX)
}

/// Check `candidate` against a stored credential of either form
pub fn verify(stored: &str, candidate: &str) -> bool {
    if !is_hashed(stored) {
        return stored == candidate;
    }

    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_form() {
        let stored = seal("admin123", false).unwrap();
        assert_eq!(stored, "admin123");
        assert!(verify(&stored, "admin123"));
        assert!(!verify(&stored, "Admin123"));
    }

    #[test]
    fn test_hashed_form() {
        let stored = seal("s3cret", true).unwrap();
        assert!(is_hashed(&stored));
        assert_ne!(stored, "s3cret");
        assert!(verify(&stored, "s3cret"));
        assert!(!verify(&stored, "wrong"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify("$argon2id$garbage", "$argon2id$garbage"));
    }
}
