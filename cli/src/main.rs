use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use itsm_client::net::types::PageQuery;
use itsm_client::{
    ApiClient, AuthError, ClientConfig, ConfigError, FetchError, FileStore, HttpAuthBackend, SessionManager,
};
use serde_json::{Value, json};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("not logged in; run `itsm login` first")]
    NotLoggedIn,
    #[error("session expired or revoked ({0}); run `itsm login` again")]
    SessionExpired(FetchError),
    #[error("missing password; pass --password or set ITSM_PASSWORD")]
    MissingPassword,
    #[error("no session file location; pass --session-file or set ITSM_SESSION_FILE")]
    NoSessionFile,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "itsm", about = "ITSM desk API session CLI")]
struct Cli {
    /// API base URL, e.g. `https://desk.example.com/api`.
    #[arg(long, env = "ITSM_API_BASE_URL")]
    base_url: Option<String>,

    /// Where the session is persisted between runs. Defaults to `~/.itsm/session.json`.
    #[arg(long, env = "ITSM_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Log requests and session transitions to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange credentials for a session.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "ITSM_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the session and notify the backend.
    Logout,
    /// Print the signed-in profile.
    Whoami,
    /// Authenticated GET; prints the JSON body.
    Get { path: String },
    /// Authenticated GET of one page of a list endpoint.
    List {
        path: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
    },
}

struct CliContext {
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(cli.base_url.as_deref())?;
    let session_file = match cli.session_file {
        Some(path) => path,
        None => default_session_file().ok_or(CliError::NoSessionFile)?,
    };
    tracing::debug!(base_url = %config.base_url, session_file = %session_file.display(), "starting");

    let api = Arc::new(ApiClient::new(config)?);
    let backend = Arc::new(HttpAuthBackend::new(api.clone()));
    let session = Arc::new(SessionManager::new(Arc::new(FileStore::new(session_file)), backend));
    session.hydrate();
    let ctx = CliContext { api, session };

    match cli.command {
        Command::Login { username, password } => run_login(&ctx, &username, password).await,
        Command::Logout => run_logout(&ctx).await,
        Command::Whoami => run_whoami(&ctx),
        Command::Get { path } => run_get(&ctx, &path).await,
        Command::List { path, page, page_size } => run_list(&ctx, &path, PageQuery::new(page, page_size)).await,
    }
}

/// Environment config, with `--base-url` taking precedence over the environment.
fn resolve_config(base_url: Option<&str>) -> Result<ClientConfig, CliError> {
    let config = ClientConfig::from_env()?;
    Ok(match base_url {
        Some(url) => ClientConfig { timeouts: config.timeouts, ..ClientConfig::new(url) },
        None => config,
    })
}

fn default_session_file() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home).join(".itsm").join("session.json"))
}

async fn run_login(ctx: &CliContext, username: &str, password: Option<String>) -> Result<(), CliError> {
    let password = password.filter(|p| !p.is_empty()).ok_or(CliError::MissingPassword)?;
    ctx.session.login(username, &password).await?;
    match ctx.session.user() {
        Some(user) => println!("logged in as {} (id {}, role {})", user.name, user.id, user.role),
        None => println!("logged in"),
    }
    Ok(())
}

async fn run_logout(ctx: &CliContext) -> Result<(), CliError> {
    let was_signed_in = ctx.session.is_authenticated();
    finish_logout(ctx).await;
    println!("{}", if was_signed_in { "logged out" } else { "not logged in" });
    Ok(())
}

/// Clear the session and wait for the backend notification so the process
/// does not exit underneath it.
async fn finish_logout(ctx: &CliContext) {
    let Some(handle) = ctx.session.logout() else {
        return;
    };
    if let Err(e) = handle.await {
        tracing::warn!(error = %e, "logout notification task failed");
    }
}

fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    match ctx.session.user().filter(|_| ctx.session.is_authenticated()) {
        Some(user) => print_json(&serde_json::to_value(user)?),
        None => {
            println!("not logged in");
            Ok(())
        }
    }
}

async fn run_get(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    ensure_signed_in(ctx)?;
    let client = ctx.session.authed_client(ctx.api.clone());
    match client.get::<Value>(path).await {
        Ok(body) => print_json(&body.unwrap_or(Value::Null)),
        Err(e) => Err(expire_on_auth_failure(ctx, e).await),
    }
}

async fn run_list(ctx: &CliContext, path: &str, query: PageQuery) -> Result<(), CliError> {
    ensure_signed_in(ctx)?;
    let client = ctx.session.authed_client(ctx.api.clone());
    match client.fetch_page::<Value>(path, query).await {
        Ok(page) => print_json(&json!({
            "count": page.count,
            "page": query.page,
            "pages": page.page_count(query.page_size),
            "results": page.results,
        })),
        Err(e) => Err(expire_on_auth_failure(ctx, e).await),
    }
}

fn ensure_signed_in(ctx: &CliContext) -> Result<(), CliError> {
    if ctx.session.is_authenticated() { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

/// A rejected credential ends the persisted session; anything else is reported as-is.
async fn expire_on_auth_failure(ctx: &CliContext, err: FetchError) -> CliError {
    if !err.is_auth_failure() {
        return CliError::Fetch(err);
    }
    finish_logout(ctx).await;
    CliError::SessionExpired(err)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
