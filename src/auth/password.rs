//! Password login.

use std::sync::{Arc, LazyLock};

use tracing::{debug, warn};

use crate::auth::employee_store::CredentialStore;
use crate::auth::error::AuthError;
use crate::db::schema::EmployeeRecord;

/// Verifies email/password pairs against the credential store.
///
/// Read-only: never writes to the store and never derives a role. Callers
/// pair the returned employee with a `RolePolicy` themselves.
pub struct PasswordAuthenticator {
    store: Arc<dyn CredentialStore>,
}

impl PasswordAuthenticator {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<EmployeeRecord, AuthError> {
        let employee = self
            .store
            .find_one(email)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let stored = employee.as_ref().and_then(|e| e.password_hash.clone());
        let password = password.to_string();
        let verified =
            tokio::task::spawn_blocking(move || check_password(&password, stored.as_deref()))
                .await
                .map_err(|e| AuthError::Internal(format!("password check aborted: {}", e)))?;

        let Some(employee) = employee else {
            debug!("password login: no employee for email");
            return Err(AuthError::InvalidCredentials);
        };

        // OAuth-provisioned accounts have no password and can't log in here.
        if employee.password_hash.is_none() {
            debug!(employee = %employee.id, "password login: account has no password");
            return Err(AuthError::InvalidCredentials);
        }

        match verified {
            Ok(true) => Ok(employee),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!(employee = %employee.id, error = %e, "stored password hash is unreadable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Hash checked when the account is unknown or has no password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("no-such-account", bcrypt::DEFAULT_COST).ok());

/// Verify `password` against `stored`. Without a stored hash the password is
/// still run through bcrypt once and the result is always `false`, so unknown
/// accounts take as long as wrong passwords.
fn check_password(password: &str, stored: Option<&str>) -> Result<bool, bcrypt::BcryptError> {
    match stored {
        Some(hash) => bcrypt::verify(password, hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = bcrypt::verify(password, dummy);
            }
            Ok(false)
        }
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::Internal(format!("failed to hash password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::employee_store::EmployeeStore;
    use crate::db::schema::EmployeeCreate;
    use crate::db::{DatabaseConfig, create_connection, ensure_schema};
    use anyhow::anyhow;
    use async_trait::async_trait;

    const TEST_COST: u32 = 4;

    async fn setup_store() -> Arc<EmployeeStore> {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        Arc::new(EmployeeStore::new(db))
    }

    async fn seed(store: &EmployeeStore, email: &str, password: Option<&str>) -> EmployeeRecord {
        store
            .create(&EmployeeCreate {
                email: email.to_string(),
                password_hash: password.map(|p| hash_password(p, TEST_COST).unwrap()),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_email_is_invalid_credentials() {
        let auth = PasswordAuthenticator::new(setup_store().await);

        let result = auth.authenticate("nobody@x.com", "any").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[test]
    fn test_missing_hash_still_runs_bcrypt() {
        let dummy = DUMMY_HASH.as_deref().unwrap();
        assert!(dummy.starts_with("$2"));
        assert!(bcrypt::verify("no-such-account", dummy).unwrap());

        assert!(!check_password("no-such-account", None).unwrap());
        assert!(!check_password("secret", None).unwrap());
    }

    #[test]
    fn test_check_password_against_stored_hash() {
        let hash = hash_password("secret", TEST_COST).unwrap();
        assert!(check_password("secret", Some(&hash)).unwrap());
        assert!(!check_password("not-secret", Some(&hash)).unwrap());
        assert!(check_password("secret", Some("not-a-bcrypt-hash")).is_err());
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credentials() {
        let store = setup_store().await;
        seed(&store, "placement.hr@co.com", Some("secret")).await;
        let auth = PasswordAuthenticator::new(store);

        let result = auth.authenticate("placement.hr@co.com", "not-secret").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_correct_password_returns_record() {
        let store = setup_store().await;
        let seeded = seed(&store, "placement.hr@co.com", Some("secret")).await;
        let auth = PasswordAuthenticator::new(store);

        let employee = auth.authenticate("placement.hr@co.com", "secret").await.unwrap();
        assert_eq!(employee.id, seeded.id);
        assert_eq!(employee.email, "placement.hr@co.com");
    }

    #[tokio::test]
    async fn test_passwordless_account_cannot_log_in() {
        let store = setup_store().await;
        seed(&store, "student42@univ.edu", None).await;
        let auth = PasswordAuthenticator::new(store);

        let result = auth.authenticate("student42@univ.edu", "").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_invalid_credentials() {
        let store = setup_store().await;
        store
            .create(&EmployeeCreate {
                email: "broken@co.com".to_string(),
                password_hash: Some("not-a-bcrypt-hash".to_string()),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();
        let auth = PasswordAuthenticator::new(store);

        let result = auth.authenticate("broken@co.com", "whatever").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    struct FailingStore;

    #[async_trait]
    impl CredentialStore for FailingStore {
        async fn find_by_email(&self, _email: &str) -> anyhow::Result<Vec<EmployeeRecord>> {
            Err(anyhow!("connection reset"))
        }

        async fn create(&self, _employee: &EmployeeCreate) -> anyhow::Result<EmployeeRecord> {
            Err(anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_not_invalid_credentials() {
        let auth = PasswordAuthenticator::new(Arc::new(FailingStore));

        let result = auth.authenticate("placement.hr@co.com", "secret").await;
        assert!(matches!(result, Err(AuthError::Store(_))));
    }
}
