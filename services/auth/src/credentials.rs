//! Credential store: registration and password authentication

use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AuthError, AuthResult};
use crate::models::{NewUser, RegisterUser, Role, User, normalize_email};
use crate::password;
use crate::repositories::UserRepository;
use crate::validation;

/// Owns user records and checks passwords against them.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }

    /// Create a user with an Argon2-hashed password.
    pub async fn register(&self, input: RegisterUser) -> AuthResult<User> {
        let role: Role = input.role.parse()?;
        let email = normalize_email(&input.email);

        validation::validate_email(&email)?;
        validation::validate_password(&input.password)?;
        validation::validate_full_name(&input.full_name)?;

        let password_hash = password::hash_password(&input.password)?;

        let user = self
            .users
            .insert(NewUser {
                id: Uuid::new_v4(),
                email,
                password_hash,
                full_name: input.full_name.trim().to_string(),
                role,
                created_at: self.clock.now(),
            })
            .await?;

        info!("Registered {} user {}", user.role, user.id);
        Ok(user)
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> AuthResult<User> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            password::verify_against_dummy(password);
            warn!("Rejected login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password(password, &user.password_hash)? {
            warn!("Rejected login attempt for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Replace a user's password after re-checking the current one.
    ///
    /// Session revocation is left to the caller.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !password::verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        validation::validate_password(new_password)?;
        let password_hash = password::hash_password(new_password)?;

        self.users
            .update_password_hash(user_id, &password_hash, self.clock.now())
            .await?;

        info!("Password changed for user {}", user_id);
        Ok(())
    }

    pub async fn find_user(&self, user_id: Uuid) -> AuthResult<Option<User>> {
        self.users.find_by_id(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::repositories::MemoryStore;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    fn registration(email: &str, role: &str) -> RegisterUser {
        RegisterUser {
            email: email.to_string(),
            password: "Sunfl0wer!".to_string(),
            full_name: "Rose Tyler".to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn register_normalizes_email_and_hides_plaintext() {
        let credentials = store();
        let user = credentials
            .register(registration("  Rose@Example.ORG ", "senior"))
            .await
            .unwrap();

        assert_eq!(user.email, "rose@example.org");
        assert_eq!(user.role, Role::Senior);
        assert_ne!(user.password_hash, "Sunfl0wer!");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn register_rejects_unknown_role_before_touching_storage() {
        let credentials = store();
        let err = credentials
            .register(registration("rose@example.org", "nurse"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRole(_)));

        // the email is still free
        assert!(
            credentials
                .register(registration("rose@example.org", "senior"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn duplicate_email_differs_only_in_case() {
        let credentials = store();
        credentials
            .register(registration("rose@example.org", "senior"))
            .await
            .unwrap();

        let err = credentials
            .register(registration("ROSE@example.org", "caregiver"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let credentials = store();
        let user = credentials
            .register(registration("rose@example.org", "senior"))
            .await
            .unwrap();

        let err = credentials
            .change_password(user.id, "Wr0ng!pass", "N3w!password")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        credentials
            .change_password(user.id, "Sunfl0wer!", "N3w!password")
            .await
            .unwrap();

        assert!(
            credentials
                .authenticate("rose@example.org", "Sunfl0wer!")
                .await
                .is_err()
        );
        assert!(
            credentials
                .authenticate("rose@example.org", "N3w!password")
                .await
                .is_ok()
        );
    }
}
