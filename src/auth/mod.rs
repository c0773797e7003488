pub mod middleware;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use middleware::{require_admin, require_auth, require_instructor};

/// Lifetime of every issued token. There is no refresh or revocation; expiry
/// is the only way a token stops working.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims carried by an identity token. `email` is the verified subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Identity payload a client exchanges for a token.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    pub fn issue(&self, identity: IdentityRequest) -> Result<String, AppError> {
        let email = identity
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::BadRequest("identity must include an email".to_string()))?;

        let now = Utc::now();
        let claims = IdentityClaims {
            email,
            name: identity.name,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Checks signature and expiry. Every failure is reported as Unauthorized.
    pub fn verify(&self, token: &str) -> Result<IdentityClaims, AppError> {
        decode::<IdentityClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("rejected bearer token: {}", e);
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> IdentityRequest {
        IdentityRequest {
            email: Some(email.to_string()),
            name: Some("Ada".to_string()),
        }
    }

    #[test]
    fn issued_token_verifies_with_one_hour_expiry() {
        let keys = TokenKeys::new(b"secret");
        let token = keys.issue(identity("ada@example.com")).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn token_from_other_secret_is_unauthorized() {
        let token = TokenKeys::new(b"one").issue(identity("ada@example.com")).unwrap();
        let err = TokenKeys::new(b"two").verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn identity_without_email_is_rejected() {
        let keys = TokenKeys::new(b"secret");
        let err = keys
            .issue(IdentityRequest { email: Some("  ".to_string()), name: None })
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
