//! Identity token service
//!
//! Issues and verifies HS256 tokens that carry only the caller's email.
//! Tokens are stateless: validity is decided by signature and expiry alone,
//! and there is no refresh path.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token lifetime in seconds
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims stored in an identity token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    /// Issued at (Unix timestamp seconds)
    pub iat: i64,
    /// Expiration (Unix timestamp seconds)
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token has expired")]
    Expired,
}

/// Signs and verifies identity tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("signing_enabled", &self.encoding_key.is_some())
            .finish()
    }
}

impl TokenService {
    /// An empty secret leaves the service unable to sign; verification then
    /// rejects everything.
    pub fn new(secret: &str) -> Self {
        let encoding_key = (!secret.is_empty()).then(|| EncodingKey::from_secret(secret.as_bytes()));
        Self {
            encoding_key,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `email`, valid for one hour from now
    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.issue_at(email, Utc::now().timestamp())
    }

    pub fn issue_at(&self, email: &str, now: i64) -> Result<String, TokenError> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| TokenError::Signing("signing secret is not configured".into()))?;

        let claims = IdentityClaims {
            email: email.to_string(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry against the current clock
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify against an explicit clock.
    ///
    /// A token is accepted up to and including `exp`; one second later it is
    /// expired.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<IdentityClaims, TokenError> {
        if self.encoding_key.is_none() {
            return Err(TokenError::Invalid("signing secret is not configured".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<IdentityClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?
            .claims;

        if now > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Extract the token from an `Authorization` header value
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-with-enough-entropy-0123456789";

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(SECRET);
        let token = service.issue("guest@kitchen.test").unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.email, "guest@kitchen.test");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_valid_until_exactly_one_hour() {
        let service = TokenService::new(SECRET);
        let issued = 1_800_000_000;
        let token = service.issue_at("guest@kitchen.test", issued).unwrap();

        assert!(service.verify_at(&token, issued).is_ok());
        assert!(service.verify_at(&token, issued + TOKEN_TTL_SECS - 1).is_ok());
        assert!(service.verify_at(&token, issued + TOKEN_TTL_SECS).is_ok());
        assert!(matches!(
            service.verify_at(&token, issued + TOKEN_TTL_SECS + 1),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_expired_against_wall_clock() {
        let service = TokenService::new(SECRET);
        let token = service
            .issue_at("guest@kitchen.test", Utc::now().timestamp() - 2 * TOKEN_TTL_SECS)
            .unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let issuer = TokenService::new("another-secret-entirely-different-0000");
        let verifier = TokenService::new(SECRET);
        let token = issuer.issue("guest@kitchen.test").unwrap();

        assert!(matches!(verifier.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = TokenService::new(SECRET);
        assert!(matches!(service.verify("not-a-jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(service.verify(""), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_missing_secret_cannot_sign() {
        let service = TokenService::new("");
        assert!(matches!(
            service.issue("guest@kitchen.test"),
            Err(TokenError::Signing(_))
        ));
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(TokenService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(TokenService::extract_from_header("Bearer "), None);
        assert_eq!(TokenService::extract_from_header("Basic abc"), None);
        assert_eq!(TokenService::extract_from_header("abc"), None);
    }
}
