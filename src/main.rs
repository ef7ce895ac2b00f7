use std::sync::Arc;

use clap::Parser;
use hookuri::hooks::DEFAULT_MAX_BODY_BYTES;
use hookuri::server::{AppState, router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "6666")]
    port: u16,

    /// Replacement for `git@github.com:` in rewritten payloads.
    #[arg(long, env = "HOOKURI_SSH_URL_PREFIX")]
    ssh_url_prefix: Option<String>,

    #[arg(long, env = "HOOKURI_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let state = Arc::new(AppState::new(args.ssh_url_prefix.clone(), args.max_body_bytes));
    let app = router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("hookuri listening on {}", addr);
    match &args.ssh_url_prefix {
        Some(prefix) => info!(%prefix, "ssh url rewriting enabled"),
        None => warn!("No ssh url prefix configured - the rewrite route is disabled"),
    }

    axum::serve(listener, app).await?;
    Ok(())
}
