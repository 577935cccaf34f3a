//! paysync webhook receiver
//!
//! Receives provider webhooks, verifies them, and applies them to an
//! in-memory document store according to a JSON sync configuration.
//!
//! Usage:
//!   paysync-server --config sync.json --port 4242
//!
//! The API key and endpoint secret are read from `STRIPE_SECRET_KEY` and
//! `STRIPE_WEBHOOKS_ENDPOINT_SECRET` unless given as flags.

use std::{fs, path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use paysync_server::{build_router, AppState};
use paysync_storage::MemoryStore;
use paysync_sync::{
    EngineConfig, InboundSyncHandler, StripeClient, StripeConfig, SyncConfigFile, VerifierConfig,
    WebhookVerifier,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "paysync-server")]
#[command(about = "paysync webhook receiver")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "4242")]
    port: u16,

    /// Path to the JSON sync configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Provider secret API key
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    stripe_secret_key: String,

    /// Webhook endpoint signing secret
    #[arg(long, env = "STRIPE_WEBHOOKS_ENDPOINT_SECRET", hide_env_values = true)]
    webhook_secret: String,

    /// Provider API base URL
    #[arg(long, default_value = "https://api.stripe.com")]
    stripe_api_base: String,

    /// Force test mode (implied by a test API key)
    #[arg(long)]
    test_mode: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let raw = fs::read_to_string(&args.config)
        .with_context(|| format!("reading sync configuration {}", args.config.display()))?;
    let file = SyncConfigFile::from_json(&raw).context("parsing sync configuration")?;
    let registry = file.build_registry().context("building sync registry")?;
    info!(
        rules = registry.rules().len(),
        bindings = registry.bound_event_types().len(),
        "loaded sync configuration"
    );

    let stripe = StripeConfig {
        api_key: args.stripe_secret_key,
        api_base_url: args.stripe_api_base,
        ..Default::default()
    };
    let config = EngineConfig {
        test_mode: args.test_mode || stripe.is_test_key(),
        ..Default::default()
    };
    if config.test_mode {
        info!("running in test mode");
    }

    let inbound = InboundSyncHandler::new(
        Arc::new(registry),
        Arc::new(MemoryStore::new()),
        Arc::new(StripeClient::new(stripe)),
        config,
    );
    let verifier = WebhookVerifier::new(VerifierConfig::new(args.webhook_secret));
    let app = build_router(Arc::new(AppState::new(verifier, inbound)));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("binding port {}", args.port))?;
    info!("webhook receiver listening on port {}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
