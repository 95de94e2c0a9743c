// JWT token generation and validation service

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::auth::{
    error::{AuthError, TokenError},
    models::Credential,
};
use crate::config::SigningKey;

/// Token lifetime: 10 hours
pub const TOKEN_TTL_SECONDS: i64 = 36_000;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // username
    pub roles: BTreeSet<String>,  // role names, e.g. "USER"
    pub iat: i64,                 // issued at, epoch seconds
    pub exp: i64,                 // expiry, epoch seconds
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Token service for JWT operations (HS256)
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a new TokenService from the process signing key
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `validate_at`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        }
    }

    /// Issue a token for `subject` carrying `roles`, valid for 10 hours
    pub fn issue(&self, subject: &str, roles: &BTreeSet<String>) -> Result<String, AuthError> {
        self.issue_at(subject, roles, Utc::now().timestamp())
    }

    /// Issue a token for an identity
    pub fn issue_for<C: Credential + ?Sized>(&self, identity: &C) -> Result<String, AuthError> {
        self.issue(identity.username(), &identity.roles())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        roles: &BTreeSet<String>,
        now: i64,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECONDS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Validate a token against the current time
    pub fn validate(
        &self,
        token: &str,
        expected_subject: Option<&str>,
    ) -> Result<Claims, TokenError> {
        self.validate_at(token, expected_subject, Utc::now().timestamp())
    }

    /// Validate a token as of `now` (epoch seconds).
    ///
    /// Checks run in order: signature and format, expiry, subject.
    /// A token is already expired at `now == exp`.
    pub fn validate_at(
        &self,
        token: &str,
        expected_subject: Option<&str>,
        now: i64,
    ) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })?;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        if let Some(expected) = expected_subject {
            if claims.sub != expected {
                return Err(TokenError::SubjectMismatch);
            }
        }

        Ok(claims)
    }
}
