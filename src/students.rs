//! Read-only student placement queries.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::db::{Db, QueryBuilder, StudentRecord};

/// Placement view returned by the `/student` endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPlacement {
    pub first_name: String,
    pub last_name: String,
    pub program: Option<String>,
    pub placement_org: Option<String>,
    pub alumni_org: Option<String>,
    pub graduation_year: Option<i64>,
    pub is_alumni: bool,
    pub placement_status: Option<String>,
    pub ctc: Option<f64>,
}

impl From<StudentRecord> for StudentPlacement {
    fn from(record: StudentRecord) -> Self {
        Self {
            first_name: record.first_name,
            last_name: record.last_name,
            program: record.program,
            placement_org: record.placement_org,
            alumni_org: record.alumni_org,
            graduation_year: record.graduation_year,
            is_alumni: record.is_alumni,
            placement_status: record.placement_status,
            ctc: record.ctc,
        }
    }
}

impl StudentPlacement {
    /// Case-insensitive substring match over the searchable text fields.
    ///
    /// An empty (or all-whitespace) keyword matches everything.
    pub fn matches(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        [
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.program.as_deref(),
            self.placement_org.as_deref(),
            self.alumni_org.as_deref(),
            self.placement_status.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Filter and order placements for display: last name, then first name.
pub fn search(records: Vec<StudentRecord>, keyword: &str) -> Vec<StudentPlacement> {
    let mut placements: Vec<StudentPlacement> = records
        .into_iter()
        .map(StudentPlacement::from)
        .filter(|p| p.matches(keyword))
        .collect();

    placements.sort_by(|a, b| {
        a.last_name
            .to_lowercase()
            .cmp(&b.last_name.to_lowercase())
            .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
    });

    placements
}

/// Database-backed access to placement records.
#[derive(Clone)]
pub struct StudentDirectory {
    db: Db,
}

impl StudentDirectory {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> Result<Vec<StudentPlacement>> {
        self.by_keyword("").await
    }

    pub async fn by_keyword(&self, keyword: &str) -> Result<Vec<StudentPlacement>> {
        let records = QueryBuilder::list_students(&self.db).await?;
        Ok(search(records, keyword))
    }
}
