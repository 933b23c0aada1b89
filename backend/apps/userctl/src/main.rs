//! userctl Entry Point
//!
//! Loads a batch of user records into an in-memory store, then lists or
//! searches them.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::AppError`.
//!
//! ```text
//! userctl <records.json> [list | search <query>]
//! ```

use anyhow::{Context, bail};
use kernel::{AppError, AppResult};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use users::{
    CreateUsersUseCase, ListUsersUseCase, MemoryUserStore, SearchUsersUseCase, UserDto,
    UserDtoType, UserError, UsersConfig,
};

const USAGE: &str = "usage: userctl <records.json> [list | search <query>]";

enum Command {
    List,
    Search(String),
}

struct Invocation {
    records: PathBuf,
    command: Command,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Invocation> {
    let Some(records) = args.next() else {
        bail!(USAGE);
    };
    let command = match args.next().as_deref() {
        None | Some("list") => Command::List,
        Some("search") => Command::Search(args.next().unwrap_or_default()),
        Some(other) => bail!("unknown command `{other}`\n{USAGE}"),
    };
    Ok(Invocation {
        records: PathBuf::from(records),
        command,
    })
}

fn load_config() -> anyhow::Result<UsersConfig> {
    match env::var("USERCTL_MAX_BATCH") {
        Ok(raw) => {
            let max = raw
                .parse()
                .with_context(|| format!("USERCTL_MAX_BATCH must be a number, got `{raw}`"))?;
            Ok(UsersConfig::with_max_batch_size(max))
        }
        Err(_) => Ok(UsersConfig::default()),
    }
}

/// Read the record file: a JSON array of records, or a single record
fn read_records(path: &Path) -> AppResult<Vec<Value>> {
    let text = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Array(records) => Ok(records),
        record => Ok(vec![record]),
    }
}

async fn run(invocation: Invocation, config: UsersConfig) -> AppResult<Vec<UserDto>> {
    let records = read_records(&invocation.records)?;

    let store = Arc::new(MemoryUserStore::new());
    let user_type = Arc::new(UserDtoType::new().map_err(UserError::from)?);
    let config = Arc::new(config);

    CreateUsersUseCase::new(store.clone(), user_type, config)
        .execute(records)
        .await
        .inspect_err(UserError::log)?;

    let users = match invocation.command {
        Command::List => ListUsersUseCase::new(store).execute().await,
        Command::Search(query) => SearchUsersUseCase::new(store).execute(&query).await,
    };
    Ok(users.inspect_err(UserError::log)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userctl=info,users=info,composer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let invocation = parse_args(env::args().skip(1))?;
    let config = load_config()?;

    tracing::info!(
        records = %invocation.records.display(),
        max_batch_size = config.max_batch_size,
        "Starting userctl"
    );

    match run(invocation, config).await {
        Ok(users) => {
            println!("{}", serde_json::to_string_pretty(&users)?);
            Ok(())
        }
        Err(err) => report(&err),
    }
}

fn report(err: &AppError) -> anyhow::Result<()> {
    if err.is_server_error() {
        tracing::error!(status = err.status_code(), error = %err, "userctl failed");
    } else {
        tracing::warn!(status = err.status_code(), error = %err, "userctl failed");
    }
    eprintln!("{}", serde_json::to_string_pretty(&err.to_problem_json())?);
    std::process::exit(1);
}
