// Password hashing and verification service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

use crate::auth::error::AuthError;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a fresh random salt.
    /// The returned PHC string embeds algorithm, parameters and salt.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHashError)
    }

    /// Verify a password against a stored digest.
    /// Malformed digests verify as `false`, same as a wrong password.
    pub fn verify_password(password: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_is_salted() {
        let first = PasswordService::hash_password("secret123").unwrap();
        let second = PasswordService::hash_password("secret123").unwrap();

        assert_ne!(first, second);
        assert!(PasswordService::verify_password("secret123", &first));
        assert!(PasswordService::verify_password("secret123", &second));
    }

    #[test]
    fn test_hash_is_argon2id_phc() {
        let digest = PasswordService::hash_password("secret123").unwrap();
        assert!(digest.starts_with("$argon2id$"));
        assert!(!digest.contains("secret123"));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let digest = PasswordService::hash_password("secret123").unwrap();
        assert!(!PasswordService::verify_password("secret124", &digest));
        assert!(!PasswordService::verify_password("", &digest));
    }

    #[test]
    fn test_malformed_digest_fails_closed() {
        assert!(!PasswordService::verify_password("secret123", ""));
        assert!(!PasswordService::verify_password("secret123", "not-a-digest"));
        assert!(!PasswordService::verify_password("secret123", "$argon2id$v=19$garbage"));
        assert!(!PasswordService::verify_password(
            "secret123",
            "$2a$10$N9qo8uLOickgx2ZMRZoMyeIjZAgcfl7p92ldGxad68LJZdL17lhWy"
        ));
    }

    proptest! {
        // Argon2 is slow; keep the case count small
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_verify_matches_only_hashed_password(
            password in "[a-zA-Z0-9!@#]{1,24}",
            other in "[a-zA-Z0-9!@#]{1,24}"
        ) {
            let digest = PasswordService::hash_password(&password)?;
            prop_assert!(PasswordService::verify_password(&password, &digest));
            if other != password {
                prop_assert!(!PasswordService::verify_password(&other, &digest));
            }
        }
    }
}
