use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL")
                .unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE")
                .unwrap_or_else(|_| "placement".to_string()),
            database: env::var("SURREALDB_DATABASE")
                .unwrap_or_else(|_| "tracker".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = vec![
        // Employees. Email is indexed but not UNIQUE, so
        // duplicate rows can exist and lookups must pick one deterministically.
        "DEFINE TABLE IF NOT EXISTS employee SCHEMAFULL;
         DEFINE FIELD IF NOT EXISTS email ON TABLE employee TYPE string;
         DEFINE FIELD IF NOT EXISTS password_hash ON TABLE employee TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS first_name ON TABLE employee TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS last_name ON TABLE employee TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS created_at ON TABLE employee TYPE datetime DEFAULT time::now();
         DEFINE INDEX IF NOT EXISTS employee_email ON TABLE employee COLUMNS email;",

        // Student placement records (read-only through the API)
        "DEFINE TABLE IF NOT EXISTS student SCHEMAFULL;
         DEFINE FIELD IF NOT EXISTS first_name ON TABLE student TYPE string;
         DEFINE FIELD IF NOT EXISTS last_name ON TABLE student TYPE string;
         DEFINE FIELD IF NOT EXISTS program ON TABLE student TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS placement_org ON TABLE student TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS alumni_org ON TABLE student TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS graduation_year ON TABLE student TYPE option<int>;
         DEFINE FIELD IF NOT EXISTS is_alumni ON TABLE student TYPE bool DEFAULT false;
         DEFINE FIELD IF NOT EXISTS placement_status ON TABLE student TYPE option<string>;
         DEFINE FIELD IF NOT EXISTS ctc ON TABLE student TYPE option<float>;
         DEFINE FIELD IF NOT EXISTS created_at ON TABLE student TYPE datetime DEFAULT time::now();",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}
