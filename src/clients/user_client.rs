use tracing::{debug, info, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::auth::password::{hash_password, verify_password};
use crate::domain::{normalize_email, Role, User, UserCreate, UserPatch};
use crate::user_actor::UserError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Self-service sign-up form. Registration always yields a customer.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_client_methods!(UserClient, User, UserError, user);

impl UserClient {
    pub fn new(inner: ResourceClient<User>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, registration), fields(user_email = %registration.email))]
    pub async fn register(&self, registration: Registration) -> Result<User, UserError> {
        debug!("Sending request");
        self.create_account(
            registration.name,
            registration.email,
            &registration.password,
            Role::Customer,
            registration.phone,
            registration.address,
        )
        .await
    }

    async fn create_account(
        &self,
        name: String,
        email: String,
        password: &str,
        role: Role,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<User, UserError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::ValidationError(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let payload = UserCreate {
            name,
            email,
            password_hash: hash_password(password),
            role,
            phone,
            address,
        };
        let user = self.inner.create(payload).await.map_err(UserError::from)?;
        info!(user_id = %user.id, role = %user.role(), "Account created");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        debug!("Sending request");
        let email = normalize_email(email);
        let mut matches = self
            .inner
            .list_where(move |user: &User| user.email == email)
            .await
            .map_err(UserError::from)?;
        Ok(matches.pop())
    }

    /// Checks an email/password pair. Unknown emails and wrong passwords are
    /// reported identically.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError> {
        debug!("Sending request");
        match self.find_by_email(email).await? {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => {
                warn!("Rejected login attempt");
                Err(UserError::InvalidCredentials)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn update_user(&self, id: String, patch: UserPatch) -> Result<User, UserError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(UserError::from)
    }

    /// Creates the configured administrator account unless the email is
    /// already registered.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<User, UserError> {
        if let Some(existing) = self.find_by_email(email).await? {
            if !existing.is_admin() {
                warn!(user_id = %existing.id, "Bootstrap email belongs to a customer account");
            }
            return Ok(existing);
        }
        self.create_account(name.to_string(), email.to_string(), password, Role::Admin, None, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn start() -> UserClient {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("user_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, client) = ResourceActor::<User>::new(10, next_id);
        tokio::spawn(actor.run());
        UserClient::new(client)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Alice".into(),
            email: email.into(),
            password: "s3cret!".into(),
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_customer() {
        let users = start();
        let user = users.register(registration("Alice@Example.com ")).await.unwrap();
        assert_eq!(user.role(), Role::Customer);
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password_hash, "s3cret!");
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected_case_insensitively() {
        let users = start();
        users.register(registration("alice@example.com")).await.unwrap();
        let err = users.register(registration("ALICE@example.com")).await.unwrap_err();
        assert_eq!(err, UserError::AlreadyExists("alice@example.com".into()));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let users = start();
        let mut form = registration("bob@example.com");
        form.password = "123".into();
        assert!(matches!(users.register(form).await, Err(UserError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_authenticate_checks_password() {
        let users = start();
        let user = users.register(registration("alice@example.com")).await.unwrap();

        let found = users.authenticate("alice@example.com", "s3cret!").await.unwrap();
        assert_eq!(found.id, user.id);

        assert_eq!(
            users.authenticate("alice@example.com", "wrong").await.unwrap_err(),
            UserError::InvalidCredentials
        );
        assert_eq!(
            users.authenticate("nobody@example.com", "s3cret!").await.unwrap_err(),
            UserError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let users = start();
        let first = users.ensure_admin("Owner", "owner@example.com", "adminpass").await.unwrap();
        assert!(first.is_admin());
        let second = users.ensure_admin("Owner", "owner@example.com", "adminpass").await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
