//! Signed, time-bound bearer credentials (HS256 JWTs).

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::domain::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        self.issue_at(subject, role, Utc::now())
    }

    pub fn issue_at(&self, subject: &str, role: Role, now: DateTime<Utc>) -> Result<String, AuthError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            role,
            exp: now.timestamp().saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Backend(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    fn signer() -> TokenSigner {
        TokenSigner::new("test-secret", Duration::from_secs(60))
    }

    #[test]
    fn test_issued_token_verifies() {
        let token = signer().issue("user_1", Role::Admin).unwrap();
        assert_eq!(token.split('.').count(), 3);
        let claims = signer().verify(&token).unwrap();
        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - chrono::Duration::seconds(120);
        let token = signer().issue_at("user_1", Role::Customer, issued).unwrap();
        assert_eq!(signer().verify(&token).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = signer().issue("user_1", Role::Customer).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = Claims { sub: "user_1".into(), role: Role::Admin, exp: i64::MAX };
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap()),
            parts[2]
        );
        assert!(matches!(signer().verify(&forged), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = TokenSigner::new("other", Duration::from_secs(60))
            .issue("user_1", Role::Customer)
            .unwrap();
        assert!(matches!(signer().verify(&token), Err(AuthError::InvalidToken(_))));
        assert!(matches!(signer().verify("garbage"), Err(AuthError::InvalidToken(_))));
    }
}
