//! Argon2id password hashes, stored as PHC strings
//! (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`).

use argon2::password_hash::{self, PasswordHash as PhcString, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(password_hash::Error);

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

impl PasswordHash {
    /// Hash a plaintext password with a fresh random salt.
    pub fn generate(password: &str) -> Result<Self, PasswordHashError> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(PasswordHashError)?;
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordHashError)?;
        Ok(Self(phc.to_string()))
    }

    /// Wrap a value loaded from storage.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        Self(stored.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a plaintext candidate. Parameters come from the stored string, so
    /// hashes made with older settings keep verifying. Malformed stored values
    /// never verify.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = PhcString::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_verifies() {
        let hash = PasswordHash::generate("correct horse").unwrap();
        assert!(hash.verify("correct horse"));
        assert!(!hash.verify("wrong horse"));
    }

    #[test]
    fn same_password_gets_different_salts() {
        let a = PasswordHash::generate("pw").unwrap();
        let b = PasswordHash::generate("pw").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stored_value_is_a_phc_string_that_round_trips() {
        let hash = PasswordHash::generate("pw").unwrap();
        assert!(hash.as_str().starts_with("$argon2id$"));

        let restored = PasswordHash::from_stored(hash.as_str().to_string());
        assert!(restored.verify("pw"));
        assert!(!restored.verify("pw "));
    }

    #[test]
    fn malformed_stored_value_never_verifies() {
        assert!(!PasswordHash::from_stored("").verify(""));
        assert!(!PasswordHash::from_stored("plaintext").verify("plaintext"));
        assert!(!PasswordHash::from_stored("sha256$3$00$00").verify("pw"));
        assert!(!PasswordHash::from_stored("$argon2id$v=19$m=19456,t=2,p=1$bad").verify("pw"));
    }

    #[test]
    fn debug_does_not_leak_digest() {
        let hash = PasswordHash::generate("pw").unwrap();
        assert_eq!(format!("{hash:?}"), "PasswordHash(..)");
    }
}
