//! Access gate: verifies bearer credentials and resolves the acting identity.
//!
//! Two capability levels exist. [`Capability::Authenticated`] accepts any valid
//! credential whose subject still exists; [`Capability::Administrator`]
//! additionally requires the stored account to carry the admin role. The role
//! is read from the user record, not from the token claims.

pub mod password;
pub mod token;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::clients::UserClient;
use crate::domain::{Identity, User};
pub use token::{Claims, TokenSigner};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("No token, authorization denied")]
    MissingToken,
    #[error("Token is not valid: {0}")]
    InvalidToken(String),
    #[error("Token has expired")]
    Expired,
    #[error("Access denied: {0}")]
    Forbidden(String),
    #[error("Auth backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Authenticated,
    Administrator,
}

/// Extracts the credential from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[derive(Clone)]
pub struct AccessGate {
    signer: TokenSigner,
    users: UserClient,
}

impl AccessGate {
    pub fn new(signer: TokenSigner, users: UserClient) -> Self {
        Self { signer, users }
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.signer.issue(&user.id, user.role())
    }

    #[instrument(skip(self, token))]
    pub async fn authorize(&self, token: Option<&str>, capability: Capability) -> Result<Identity, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let claims = self.signer.verify(token)?;

        let user = self
            .users
            .get_user(claims.sub.clone())
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .ok_or_else(|| AuthError::InvalidToken("unknown subject".to_string()))?;
        let identity = user.identity();

        if capability == Capability::Administrator && !identity.is_admin() {
            warn!(user_id = %identity.user_id, "Admin capability denied");
            return Err(AuthError::Forbidden("Admin access required".to_string()));
        }

        debug!(user_id = %identity.user_id, role = %identity.role, "Credential accepted");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::clients::Registration;
    use crate::domain::Role;
    use std::time::Duration;

    async fn gate_with_users() -> (AccessGate, UserClient) {
        let (actor, client) = ResourceActor::<User>::new(10, || uuid::Uuid::new_v4().to_string());
        tokio::spawn(actor.run());
        let users = UserClient::new(client);
        let gate = AccessGate::new(TokenSigner::new("secret", Duration::from_secs(60)), users.clone());
        (gate, users)
    }

    fn form(email: &str) -> Registration {
        Registration {
            name: "Carol".into(),
            email: email.into(),
            password: "password".into(),
            phone: None,
            address: None,
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[tokio::test]
    async fn test_customer_is_authenticated_but_not_admin() {
        let (gate, users) = gate_with_users().await;
        let user = users.register(form("carol@example.com")).await.unwrap();
        let token = gate.issue(&user).unwrap();

        let identity = gate.authorize(Some(&token), Capability::Authenticated).await.unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.role, Role::Customer);

        assert!(matches!(
            gate.authorize(Some(&token), Capability::Administrator).await,
            Err(AuthError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_admin_capability_granted_to_admin() {
        let (gate, users) = gate_with_users().await;
        let admin = users.ensure_admin("Owner", "owner@example.com", "adminpass").await.unwrap();
        let token = gate.issue(&admin).unwrap();
        let identity = gate.authorize(Some(&token), Capability::Administrator).await.unwrap();
        assert!(identity.is_admin());
    }

    #[tokio::test]
    async fn test_missing_and_orphaned_tokens_rejected() {
        let (gate, _users) = gate_with_users().await;
        assert_eq!(
            gate.authorize(None, Capability::Authenticated).await.unwrap_err(),
            AuthError::MissingToken
        );

        let orphan = TokenSigner::new("secret", Duration::from_secs(60))
            .issue("ghost", Role::Admin)
            .unwrap();
        assert!(matches!(
            gate.authorize(Some(&orphan), Capability::Authenticated).await,
            Err(AuthError::InvalidToken(_))
        ));
    }
}
