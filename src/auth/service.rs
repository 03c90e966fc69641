//! Registration, login and token validation.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::{TokenError, TokenManager};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::Principal;
use crate::error::{DomainError, ServiceError, ServiceResult};
use crate::store::{NewUser, Store, User};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// A freshly issued token and the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

/// Already validated registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    tokens: TokenManager,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenManager) -> Self {
        Self { store, tokens }
    }

    /// Check credentials and issue a token.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let email = email.trim().to_lowercase();
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated(INVALID_CREDENTIALS.into()))?;

        let candidate = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&candidate, &hash))
            .await
            .context("password verification task failed")?;

        if !valid {
            return Err(DomainError::Unauthenticated(INVALID_CREDENTIALS.into()).into());
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.session_for(&user)
    }

    /// Create an account and issue a token.
    pub async fn register(&self, registration: Registration) -> ServiceResult<AuthSession> {
        let email = registration.email.trim().to_lowercase();

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("User already exists with this email".into()).into());
        }

        let password = registration.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task failed")??;

        let user = self
            .store
            .insert_user(NewUser {
                email,
                password_hash,
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Verify a token and resolve the user it names.
    ///
    /// Every failure collapses to a single "Invalid token" kind.
    pub async fn validate_token(&self, token: &str) -> ServiceResult<UserProfile> {
        let invalid = || ServiceError::from(DomainError::Unauthenticated("Invalid token".into()));

        let principal = self.tokens.verify(token).map_err(|_| invalid())?;
        match self.store.find_user_by_id(principal.id).await {
            Ok(Some(user)) => Ok(UserProfile::from(&user)),
            Ok(None) => Err(invalid()),
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed during token validation");
                Err(invalid())
            }
        }
    }

    /// Stateless verification used by the request guard.
    pub fn verify_bearer(&self, token: &str) -> Result<Principal, TokenError> {
        self.tokens.verify(token)
    }

    fn session_for(&self, user: &User) -> ServiceResult<AuthSession> {
        let token = self
            .tokens
            .issue(user.id, &user.email)
            .context("token generation failed")?;

        Ok(AuthSession {
            token,
            user: UserProfile::from(user),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::store::InMemoryStore;

    fn service() -> AuthService {
        let tokens = TokenManager::new(&AuthConfig {
            jwt_secret: "test_secret".into(),
            ..AuthConfig::default()
        });
        AuthService::new(Arc::new(InMemoryStore::new()), tokens)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.into(),
            password: "secret123".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service();
        let session = auth.register(registration("Ada@Example.com")).await.unwrap();
        assert_eq!(session.user.email, "ada@example.com");

        let login = auth.login("ada@example.com", "secret123").await.unwrap();
        assert_eq!(login.user, session.user);

        let profile = auth.validate_token(&login.token).await.unwrap();
        assert_eq!(profile.id, session.user.id);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let auth = service();
        auth.register(registration("a@example.com")).await.unwrap();

        let err = auth.register(registration("a@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let auth = service();
        auth.register(registration("a@example.com")).await.unwrap();

        for (email, password) in [("a@example.com", "wrong-password"), ("b@example.com", "secret123")] {
            let err = auth.login(email, password).await.unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Domain(DomainError::Unauthenticated(ref m)) if m == "Invalid credentials"
            ));
        }
    }

    #[tokio::test]
    async fn test_token_for_unknown_user() {
        let auth = service();
        let token = auth.tokens.issue(Uuid::new_v4(), "ghost@example.com").unwrap();

        let err = auth.validate_token(&token).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Unauthenticated(_))));
    }
}
