// Database query helpers for the student placement tables.

use anyhow::{Result, anyhow};
use surrealdb::{Surreal, engine::any::Any};

use crate::db::schema::*;

pub struct QueryBuilder;

impl QueryBuilder {
    /// Insert a single student placement record.
    pub async fn create_student(
        db: &Surreal<Any>,
        data: &StudentCreate,
    ) -> Result<StudentRecord> {
        let mut res = db
            .query(
                r#"
                CREATE student SET
                    first_name = $first_name,
                    last_name = $last_name,
                    program = $program,
                    placement_org = $placement_org,
                    alumni_org = $alumni_org,
                    graduation_year = $graduation_year,
                    is_alumni = $is_alumni,
                    placement_status = $placement_status,
                    ctc = $ctc
                "#,
            )
            .bind(("first_name", data.first_name.clone()))
            .bind(("last_name", data.last_name.clone()))
            .bind(("program", data.program.clone()))
            .bind(("placement_org", data.placement_org.clone()))
            .bind(("alumni_org", data.alumni_org.clone()))
            .bind(("graduation_year", data.graduation_year))
            .bind(("is_alumni", data.is_alumni))
            .bind(("placement_status", data.placement_status.clone()))
            .bind(("ctc", data.ctc))
            .await?;

        let created: Vec<StudentRecord> = res.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("failed to create student record"))
    }

    /// Load every student placement record.
    ///
    /// Filtering and ordering happen in `StudentDirectory`, where they can be
    /// tested without a database.
    pub async fn list_students(db: &Surreal<Any>) -> Result<Vec<StudentRecord>> {
        let mut res = db.query("SELECT * FROM student").await?;
        let students: Vec<StudentRecord> = res.take(0)?;
        Ok(students)
    }
}
