// This is the entry point of the issue guard.
//
// **Architecture Overview:**
// - `core/` = Business logic (heuristics, prompts, classification, moderation flow)
// - `infra/` = Implementations of core traits (GitHub REST, chat completions API)
// - `webhook/` = GitHub webhook adapter (signature check, event routing, HTTP server)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the webhook endpoint

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "webhook/webhook_layer.rs"]
mod webhook;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::core::ai::{AiSpamClassifier, ClassifierSettings};
use crate::core::moderation::{HeuristicConfig, ModerationService};
use crate::infra::ai::OpenAiClient;
use crate::infra::github::GithubApiClient;
use crate::webhook::WebhookState;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let bind_addr: SocketAddr = env_opt("BIND_ADDR")
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .context("BIND_ADDR is not a valid socket address")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let github_client = GithubApiClient::new(env_opt("GITHUB_TOKEN"), env_opt("GITHUB_API_URL"))
        .context("Failed to create GitHub API client")?;

    // Missing key/model is reported per classification attempt, not here
    let classifier_settings = ClassifierSettings {
        api_key: env_opt("OPENAI_API_KEY"),
        model: env_opt("OPENAI_MODEL"),
    };
    if classifier_settings.api_key.is_none() || classifier_settings.model.is_none() {
        tracing::warn!("OPENAI_API_KEY or OPENAI_MODEL is not set, every issue will be skipped");
    }
    let classifier = AiSpamClassifier::new(
        OpenAiClient::new(env_opt("OPENAI_BASE_URL")),
        classifier_settings,
    );

    let moderation = Arc::new(ModerationService::new(
        github_client,
        classifier,
        HeuristicConfig::default(),
    ));

    let secret = env_opt("WEBHOOK_SECRET").map(Arc::<str>::from);
    if secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET is not set, webhook signatures will not be verified");
    }

    let app = webhook::router(WebhookState { moderation, secret });

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .context("failed to bind webhook server")?;

    tracing::info!(addr = %bind_addr, path = webhook::server::WEBHOOK_PATH, "issue guard loaded");

    axum::serve(listener, app)
        .await
        .context("webhook server error")?;

    Ok(())
}
