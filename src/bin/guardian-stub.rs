//! Guardian contract stub
//!
//! Speaks the governance process contract without any governance logic:
//! accepts the `-flag=value` argv, answers `GET /_guardian/health`, and
//! echoes every other request back as JSON so callers can see what reached
//! the proxy.

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, Uri},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guardian_shim::infrastructure::health::HEALTH_PATH;
use guardian_shim::ORIGINAL_DESTINATION_HEADER;

/// Flags of the governance argv contract
#[derive(Debug, Default)]
struct StubArgs {
    port: u16,
    service: String,
    env: String,
    config: Option<String>,
    pre_prompt: Option<String>,
    debug: bool,
}

impl StubArgs {
    /// Parse Go-style `-name=value` flags; unknown flags are ignored
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        for arg in args {
            let Some((name, value)) = arg.trim_start_matches('-').split_once('=') else {
                continue;
            };
            match name {
                "port" => parsed.port = value.parse().context("invalid -port value")?,
                "service" => parsed.service = value.to_string(),
                "env" => parsed.env = value.to_string(),
                "config" => parsed.config = Some(value.to_string()),
                "pre-prompt" => parsed.pre_prompt = Some(value.to_string()),
                "debug" => parsed.debug = value == "true",
                _ => {}
            }
        }
        anyhow::ensure!(parsed.port != 0, "-port is required");
        Ok(parsed)
    }
}

async fn health(State(args): State<Arc<StubArgs>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": args.service,
        "env": args.env,
        "config": args.config,
        "pre_prompt": args.pre_prompt,
    }))
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let original_destination = headers
        .get(ORIGINAL_DESTINATION_HEADER)
        .and_then(|value| value.to_str().ok());

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "original_destination": original_destination,
        "body": String::from_utf8_lossy(&body),
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = StubArgs::parse(std::env::args().skip(1))?;

    let level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::new(level))
        .init();

    let addr = format!("127.0.0.1:{}", args.port);
    let app = Router::new()
        .route(HEALTH_PATH, get(health))
        .fallback(echo)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(args));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Guardian stub listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(guardian_shim::cli::shutdown_signal())
        .await?;

    Ok(())
}
