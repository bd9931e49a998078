use anyhow::Result;
use clap::{Parser, Subcommand};
use jobtrackr_api::{ApiError, IngestJobRequest, JobUpdate, JobsClient};
use jobtrackr_auth::AuthSession;
use jobtrackr_config::Config;
use jobtrackr_store::SqliteStore;
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jobtrackr", about = "jobtrackr: track job applications from the terminal")]
struct Cli {
    /// Path to the YAML configuration file (default: ~/.jobtrackr/config.yaml).
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// SQLite database path (default: ~/.jobtrackr/state.db).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in through the browser.
    Login,
    /// Remove stored tokens.
    Logout,
    /// Show whether a valid session exists.
    Status,
    /// Print the identity claims of the current session.
    Whoami,
    /// Print a valid ID token, refreshing it if needed.
    Token,
    /// Manage tracked job applications.
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    /// List tracked applications.
    List {
        /// Page size.
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
        /// `next_page_token` of the previous page.
        #[arg(long)]
        last_key: Option<String>,
    },
    /// Submit a job posting URL.
    Ingest {
        url: String,
        /// Resume to attach to the application.
        #[arg(long)]
        resume_url: Option<String>,
    },
    /// Update the status or notes of an application.
    Update {
        job_id: String,
        #[arg(long)]
        applied_ts: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an application.
    Delete {
        job_id: String,
        #[arg(long)]
        applied_ts: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let session = Arc::new(open_session(&config, cli.db).await?);

    match cli.command {
        Commands::Login => cmd_login(&session).await,
        Commands::Logout => {
            session.logout().await;
            eprintln!("logged out");
            Ok(())
        }
        Commands::Status => cmd_status(&session).await,
        Commands::Whoami => cmd_whoami(&session).await,
        Commands::Token => cmd_token(&session).await,
        Commands::Jobs { command } => {
            let client = JobsClient::from_config(&config.api, session);
            cmd_jobs(&client, command).await.map_err(with_login_hint)
        }
    }
}

async fn cmd_login(session: &AuthSession) -> Result<()> {
    match session.login().await {
        Ok(user) => {
            let name = user.username.or(user.email).unwrap_or_else(|| "unknown user".into());
            eprintln!("signed in as {name}");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "login error detail");
            anyhow::bail!("login failed: {}", e.user_message())
        }
    }
}

async fn cmd_status(session: &AuthSession) -> Result<()> {
    if session.is_authenticated().await {
        let who = session
            .user_info()
            .await
            .and_then(|u| u.username.or(u.email))
            .unwrap_or_default();
        println!("authenticated {who}");
    } else {
        println!("not authenticated");
    }
    Ok(())
}

async fn cmd_whoami(session: &AuthSession) -> Result<()> {
    if !session.is_authenticated().await {
        anyhow::bail!("not signed in; run `jobtrackr login`");
    }
    let user = session
        .user_info()
        .await
        .ok_or_else(|| anyhow::anyhow!("stored ID token is unreadable"))?;
    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}

async fn cmd_token(session: &AuthSession) -> Result<()> {
    let token = session
        .get_valid_token()
        .await
        .ok_or_else(|| anyhow::anyhow!("not signed in; run `jobtrackr login`"))?;
    println!("{token}");
    Ok(())
}

async fn cmd_jobs(client: &JobsClient, command: JobsCommand) -> Result<(), ApiError> {
    match command {
        JobsCommand::List { limit, last_key } => {
            let page = client.list_jobs(limit, last_key.as_deref()).await?;
            print_json(&page);
        }
        JobsCommand::Ingest { url, resume_url } => {
            let resp = client
                .ingest_job(&IngestJobRequest { url, resume_url })
                .await?;
            print_json(&resp);
        }
        JobsCommand::Update {
            job_id,
            applied_ts,
            status,
            notes,
        } => {
            let update = JobUpdate { status, notes };
            if update.is_empty() {
                eprintln!("nothing to update; pass --status or --notes");
                return Ok(());
            }
            client.update_job(&job_id, &applied_ts, &update).await?;
            eprintln!("{job_id} updated");
        }
        JobsCommand::Delete { job_id, applied_ts } => {
            client.delete_job(&job_id, &applied_ts).await?;
            eprintln!("{job_id} deleted");
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => tracing::warn!(error = %e, "failed to render response"),
    }
}

fn with_login_hint(e: ApiError) -> anyhow::Error {
    if e.needs_login() {
        anyhow::anyhow!("{e}; run `jobtrackr login`")
    } else {
        anyhow::Error::new(e)
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let path = path.or_else(|| Some(jobtrackr_dir().join("config.yaml")).filter(|p| p.exists()));
    let config =
        Config::load(path.as_deref()).map_err(|e| anyhow::anyhow!("config error: {e}"))?;
    config.validate()?;
    Ok(config)
}

async fn open_session(config: &Config, db: Option<PathBuf>) -> Result<AuthSession> {
    let store = open_store(db).await?;
    let session = AuthSession::with_defaults(config.auth.clone(), Arc::new(store), &config.namespace)?;
    Ok(session)
}

async fn open_store(db: Option<PathBuf>) -> Result<SqliteStore> {
    let path = db.unwrap_or_else(|| jobtrackr_dir().join("state.db"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let url = format!("sqlite://{}", path.display());
    SqliteStore::new(&url)
        .await
        .map_err(|e| anyhow::anyhow!("database error: {e}"))
}

fn jobtrackr_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".jobtrackr")
}
