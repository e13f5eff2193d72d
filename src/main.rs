//! Sandgate CLI entry point.
//!
//! Provides `login`/`logout`/`status` for the auth token, `open` for
//! navigation guard evaluation, and the four sandbox service calls
//! (`health`, `run`, `images`, `create-session`).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;

use sandgate::api::SandboxClient;
use sandgate::config::{self, Config};
use sandgate::pipeline::RequestPipeline;
use sandgate::routes::{self, GuardDecision, Route};
use sandgate::store::{AuthToken, FileTokenStore, TokenStore};

/// Sandgate — client for a remote code-execution sandbox service.
#[derive(Parser)]
#[command(name = "sandgate", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Store an auth token (log in).
    Login {
        /// Opaque token issued for the sandbox service.
        token: String,
    },
    /// Remove the stored auth token (log out).
    Logout,
    /// Report whether an auth token is stored.
    Status,
    /// Evaluate the navigation guard for a view and print where it lands.
    Open {
        /// Route name: login, code-editor, or terminal-emulator.
        route: String,
    },
    /// Check sandbox service health.
    Health,
    /// Submit code for execution.
    Run {
        /// Language to execute the code with.
        #[arg(long)]
        language: String,
        /// Inline source code.
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,
        /// Read source code from a file.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Data passed to the program on standard input.
        #[arg(long)]
        stdin: Option<String>,
    },
    /// List available execution images.
    Images,
    /// Create an execution session.
    CreateSession {
        /// Image to boot the session from.
        #[arg(long)]
        image: String,
        /// Memory limit in megabytes.
        #[arg(long)]
        memory_mb: Option<u32>,
        /// CPU core limit.
        #[arg(long)]
        cpu_cores: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sandgate::logging::init();
    let cli = Cli::parse();

    let config = Config::load().context("failed to load configuration")?;

    // One store, one pipeline, one client for the whole process —
    // constructed here and passed to consumers by reference.
    let store: Arc<dyn TokenStore> =
        Arc::new(FileTokenStore::new(&config::config_dir()?));
    let pipeline = RequestPipeline::new(&config.service.base_url, Arc::clone(&store))
        .context("failed to construct request pipeline")?;
    let client = SandboxClient::new(pipeline);

    match cli.command {
        Command::Login { token } => handle_login(store.as_ref(), &token),
        Command::Logout => handle_logout(store.as_ref()),
        Command::Status => handle_status(store.as_ref()),
        Command::Open { route } => handle_open(store.as_ref(), &route),
        Command::Health => handle_health(&client, store.as_ref()).await,
        Command::Run {
            language,
            code,
            file,
            stdin,
        } => handle_run(&client, store.as_ref(), language, code, file, stdin).await,
        Command::Images => handle_images(&client, store.as_ref()).await,
        Command::CreateSession {
            image,
            memory_mb,
            cpu_cores,
        } => handle_create_session(&client, store.as_ref(), image, memory_mb, cpu_cores).await,
    }
}

/// Store the auth token. The only write path besides `logout`.
fn handle_login(store: &dyn TokenStore, token: &str) -> anyhow::Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("token must not be empty");
    }
    store.set(&AuthToken::new(token))?;
    println!("logged in");
    Ok(())
}

/// Remove the auth token.
fn handle_logout(store: &dyn TokenStore) -> anyhow::Result<()> {
    store.clear()?;
    println!("logged out");
    Ok(())
}

/// Report token presence without revealing the token.
fn handle_status(store: &dyn TokenStore) -> anyhow::Result<()> {
    if store.get().is_some() {
        println!("logged in");
    } else {
        println!("logged out");
    }
    Ok(())
}

/// Evaluate the navigation guard for a view and print the view the
/// user lands on. A redirect is silent — it is a landing view, not an
/// error.
fn handle_open(store: &dyn TokenStore, raw: &str) -> anyhow::Result<()> {
    let target: Route = raw.parse()?;
    let landing = match routes::decide(target, store) {
        GuardDecision::Proceed => target,
        GuardDecision::Redirect(to) => to,
    };
    println!("{landing}");
    Ok(())
}

/// Refuse an API action when the guard denies its owning view.
fn ensure_view(store: &dyn TokenStore, view: Route) -> anyhow::Result<()> {
    match routes::decide(view, store) {
        GuardDecision::Proceed => Ok(()),
        GuardDecision::Redirect(target) => Err(anyhow::anyhow!(
            "cannot open {view}: redirected to {target} (no auth token stored)"
        )),
    }
}

/// GET `/` and print the service's reply.
async fn handle_health(client: &SandboxClient, store: &dyn TokenStore) -> anyhow::Result<()> {
    ensure_view(store, Route::CodeEditor)?;
    let response = client.health_check().await?;
    print_response(response).await
}

/// POST `/run` with the execution payload composed from CLI flags.
async fn handle_run(
    client: &SandboxClient,
    store: &dyn TokenStore,
    language: String,
    code: Option<String>,
    file: Option<PathBuf>,
    stdin: Option<String>,
) -> anyhow::Result<()> {
    ensure_view(store, Route::CodeEditor)?;

    let source = match (code, file) {
        (Some(inline), _) => inline,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --code or --file is required"),
    };

    let mut payload = serde_json::json!({
        "language": language,
        "code": source,
    });
    if let (Some(stdin), Some(obj)) = (stdin, payload.as_object_mut()) {
        obj.insert("stdin".to_owned(), Value::String(stdin));
    }

    let response = client.run_code(&payload).await?;
    print_response(response).await
}

/// GET `/session/images` and print the service's reply.
async fn handle_images(client: &SandboxClient, store: &dyn TokenStore) -> anyhow::Result<()> {
    ensure_view(store, Route::TerminalEmulator)?;
    let response = client.session_images().await?;
    print_response(response).await
}

/// POST `/session/create` with the session payload composed from CLI flags.
async fn handle_create_session(
    client: &SandboxClient,
    store: &dyn TokenStore,
    image: String,
    memory_mb: Option<u32>,
    cpu_cores: Option<f64>,
) -> anyhow::Result<()> {
    ensure_view(store, Route::TerminalEmulator)?;

    let mut payload = serde_json::json!({ "image": image });
    if let Some(obj) = payload.as_object_mut() {
        if let Some(memory_mb) = memory_mb {
            obj.insert("memory_mb".to_owned(), Value::from(memory_mb));
        }
        if let Some(cpu_cores) = cpu_cores {
            obj.insert("cpu_cores".to_owned(), Value::from(cpu_cores));
        }
    }

    let response = client.create_session(&payload).await?;
    print_response(response).await
}

/// Print a service response body to stdout, unmodified.
async fn print_response(response: reqwest::Response) -> anyhow::Result<()> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read response body")?;
    debug!(%status, "sandbox service responded");
    println!("{body}");
    Ok(())
}
