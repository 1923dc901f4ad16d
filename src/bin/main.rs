use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use placement_tracker::auth::{CredentialStore, EmployeeStore, hash_password};
use placement_tracker::db::{EmployeeCreate, QueryBuilder, StudentCreate};
use placement_tracker::{
    AppConfig, create_app, create_connection, ensure_schema, resolve_config_path,
};

#[derive(Parser)]
#[command(name = "placement-tracker")]
#[command(about = "Student placement tracker backend")]
struct Cli {
    /// Path to placement.json (falls back to PLACEMENT_CONFIG, then ./placement.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override database.url from the config file
    #[arg(long, global = true, env = "PLACEMENT_DB_URL")]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Server {
        /// Bind address, e.g. 0.0.0.0:9191
        #[arg(long, env = "PLACEMENT_BIND")]
        bind: Option<String>,
        /// HMAC secret for signing tokens (at least 32 bytes)
        #[arg(long, env = "PLACEMENT_JWT_SECRET", hide_env_values = true)]
        jwt_secret: Option<String>,
    },
    /// Initialize the database
    Init,
    /// Register an employee who can log in with a password
    CreateEmployee {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// bcrypt work factor
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
        cost: u32,
    },
    /// List registered employees
    ListEmployees,
    /// Load placement records from a JSON array
    ImportStudents {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("placement_tracker=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config);
    let mut config = AppConfig::load(config_path.as_deref())?;
    match &config_path {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    if let Some(url) = cli.db_url {
        config.database.url = url;
    }
    info!("Using database url: {}", config.database.url);

    match cli.command {
        Commands::Server { bind, jwt_secret } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(secret) = jwt_secret {
                config.auth.jwt_secret = Some(secret);
            }
            config.validate().context("invalid configuration")?;

            if config.database.url == "memory" {
                tracing::warn!("In-memory database: employees and students are lost on exit");
            }

            let app = create_app(&config).await?;
            let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;

            info!("Placement tracker listening on http://{}", config.server.bind);
            axum::serve(listener, app).await?;
        }
        Commands::Init => {
            info!("Initializing database...");
            let db = create_connection(config.database).await?;
            ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::CreateEmployee {
            email,
            password,
            first_name,
            last_name,
            cost,
        } => {
            let db = create_connection(config.database).await?;
            ensure_schema(&db).await?;
            let store = EmployeeStore::new(db);

            if !store.find_by_email(&email).await?.is_empty() {
                tracing::warn!("An employee with this email already exists; adding another record");
            }

            let employee = store
                .create(&EmployeeCreate {
                    email,
                    password_hash: Some(hash_password(&password, cost)?),
                    first_name,
                    last_name,
                })
                .await?;

            println!("Employee created: {} ({})", employee.email, employee.id);
        }
        Commands::ListEmployees => {
            let db = create_connection(config.database).await?;
            ensure_schema(&db).await?;

            let employees = EmployeeStore::new(db).list().await?;
            if employees.is_empty() {
                println!("No employees found.");
                return Ok(());
            }

            println!("{:<40} {:<25} {:<10}", "EMAIL", "NAME", "PASSWORD");
            println!("{}", "-".repeat(77));

            for employee in employees {
                let name = match (&employee.first_name, &employee.last_name) {
                    (Some(f), Some(l)) => format!("{} {}", f, l),
                    (Some(n), None) | (None, Some(n)) => n.clone(),
                    (None, None) => "-".to_string(),
                };
                let password = if employee.password_hash.is_some() { "yes" } else { "no" };

                println!("{:<40} {:<25} {:<10}", employee.email, name, password);
            }
        }
        Commands::ImportStudents { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let students: Vec<StudentCreate> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;

            let db = create_connection(config.database).await?;
            ensure_schema(&db).await?;

            for student in &students {
                QueryBuilder::create_student(&db, student).await?;
            }

            println!("Imported {} student records", students.len());
        }
    }

    Ok(())
}
