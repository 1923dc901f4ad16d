//! Employee storage.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use surrealdb::sql::Datetime;

use crate::db::Db;
use crate::db::schema::{EmployeeCreate, EmployeeRecord};

/// Profile fields an identity provider vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedProfile {
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// What `find_or_create` did.
#[derive(Debug, Clone)]
pub enum Provisioned {
    Existing(EmployeeRecord),
    Created(EmployeeRecord),
}

impl Provisioned {
    pub fn employee(&self) -> &EmployeeRecord {
        match self {
            Provisioned::Existing(e) | Provisioned::Created(e) => e,
        }
    }
}

/// Persistence seam used by the authenticators.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Every employee whose email matches exactly, in no particular order.
    async fn find_by_email(&self, email: &str) -> Result<Vec<EmployeeRecord>>;

    /// Insert a new employee.
    async fn create(&self, employee: &EmployeeCreate) -> Result<EmployeeRecord>;

    /// Resolve an email to a single employee using [`pick_canonical`].
    async fn find_one(&self, email: &str) -> Result<Option<EmployeeRecord>> {
        Ok(pick_canonical(self.find_by_email(email).await?))
    }

    /// Return the existing employee for a federated identity, or create one
    /// without a password.
    async fn find_or_create(&self, profile: &FederatedProfile) -> Result<Provisioned> {
        if let Some(existing) = self.find_one(&profile.email).await? {
            return Ok(Provisioned::Existing(existing));
        }

        let created = self
            .create(&EmployeeCreate {
                email: profile.email.clone(),
                password_hash: None,
                first_name: profile.given_name.clone(),
                last_name: profile.family_name.clone(),
            })
            .await?;

        Ok(Provisioned::Created(created))
    }
}

/// Duplicate-email tie-break: the oldest record wins.
///
/// Storage does not enforce unique emails, so several rows can match. Records
/// are ranked by `created_at`, then by identifier for rows created at the same
/// instant. Record ids are random, so ranking on them alone would let a later
/// duplicate displace the original account. Rows without `created_at` rank last.
pub fn pick_canonical(records: Vec<EmployeeRecord>) -> Option<EmployeeRecord> {
    records
        .into_iter()
        .min_by(|a, b| canonical_rank(a).cmp(&canonical_rank(b)))
}

fn canonical_rank(employee: &EmployeeRecord) -> (bool, Option<&Datetime>, String) {
    (
        employee.created_at.is_none(),
        employee.created_at.as_ref(),
        employee.id.to_string(),
    )
}

/// SurrealDB-backed [`CredentialStore`].
pub struct EmployeeStore {
    db: Db,
}

impl EmployeeStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// List all employees, for the CLI.
    pub async fn list(&self) -> Result<Vec<EmployeeRecord>> {
        let mut res = self.db.query("SELECT * FROM employee ORDER BY email ASC").await?;
        let employees: Vec<EmployeeRecord> = res.take(0)?;
        Ok(employees)
    }
}

#[async_trait]
impl CredentialStore for EmployeeStore {
    async fn find_by_email(&self, email: &str) -> Result<Vec<EmployeeRecord>> {
        let query = "SELECT * FROM employee WHERE email = $email";

        let mut res = self
            .db
            .query(query)
            .bind(("email", email.to_string()))
            .await?;

        let employees: Vec<EmployeeRecord> = res.take(0)?;
        Ok(employees)
    }

    async fn create(&self, employee: &EmployeeCreate) -> Result<EmployeeRecord> {
        let query = r#"
            CREATE employee CONTENT {
                email: $email,
                password_hash: $password_hash,
                first_name: $first_name,
                last_name: $last_name
            }
        "#;

        let mut res = self
            .db
            .query(query)
            .bind(("email", employee.email.clone()))
            .bind(("password_hash", employee.password_hash.clone()))
            .bind(("first_name", employee.first_name.clone()))
            .bind(("last_name", employee.last_name.clone()))
            .await?;

        let employees: Vec<EmployeeRecord> = res.take(0)?;
        employees
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to create employee"))
    }
}
