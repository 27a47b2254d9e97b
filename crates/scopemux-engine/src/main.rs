//! scopemux host
//!
//! - Config: `scopemux.yaml` (or `SCOPEMUX_CONFIG`)
//! - Connects configured sessions, then serves newline-delimited JSON-RPC
//!   on stdin/stdout
//! - Logs go to stderr; stdout carries responses only
//! - EOF tears the registry down

use tokio::io::BufReader;
use tracing_subscriber::{fmt, EnvFilter};

use scopemux_core::error::Result;
use scopemux_engine::{app_state::AppState, config, transport};

const DEFAULT_CONFIG: &str = "scopemux.yaml";

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(error=%e, "scopemux-engine failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("SCOPEMUX_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let state = AppState::new(cfg)?;

    let scopes = state.pipeline().registry().scopes();
    tracing::info!(%path, ?scopes, "scopemux-engine starting");

    let input = BufReader::new(tokio::io::stdin());
    let served = transport::stdio::serve(&state, input, tokio::io::stdout()).await;

    // Tear down even when the transport failed, so every release callback runs.
    let released = state.shutdown();
    tracing::info!(?served, released, "registry torn down");
    tracing::debug!(metrics = %state.pipeline().metrics().render(), "final metrics");
    served.map(|_| ())
}
