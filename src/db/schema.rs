use serde::{Deserialize, Serialize};
use surrealdb::{RecordId, sql::Datetime};

/// Persisted representation of an employee in SurrealDB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Stable database identifier (table: `employee`).
    pub id: RecordId,
    /// Login email. Not unique at the storage level.
    pub email: String,
    /// bcrypt hash of the password. `None` for accounts provisioned through
    /// OAuth2, which can never pass password login.
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: Option<Datetime>,
}

/// Payload used when inserting a new employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeCreate {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Persisted student placement record (table: `student`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub program: Option<String>,
    pub placement_org: Option<String>,
    pub alumni_org: Option<String>,
    pub graduation_year: Option<i64>,
    #[serde(default)]
    pub is_alumni: bool,
    pub placement_status: Option<String>,
    pub ctc: Option<f64>,
    pub created_at: Option<Datetime>,
}

/// Payload used when importing a student placement record.
///
/// Field names follow the camelCase shape the front end exchanges, so an
/// export of `GET /student` can be fed straight back into `import-students`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCreate {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub placement_org: Option<String>,
    #[serde(default)]
    pub alumni_org: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i64>,
    #[serde(default)]
    pub is_alumni: bool,
    #[serde(default)]
    pub placement_status: Option<String>,
    #[serde(default)]
    pub ctc: Option<f64>,
}
