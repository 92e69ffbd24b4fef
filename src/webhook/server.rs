// HTTP surface for GitHub webhook deliveries.
//
// Each accepted `issues.opened` / `issues.edited` delivery is moderated on its
// own tokio task; the response does not wait for the moderation result.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;

use super::error::WebhookError;
use super::events::{route_event, Routed};
use super::signature::verify_signature;
use crate::core::ai::SpamClassifier;
use crate::core::github::IssuePlatform;
use crate::core::moderation::ModerationService;

pub const WEBHOOK_PATH: &str = "/api/github/webhooks";

/// Shared state for the webhook handlers.
pub struct WebhookState<P: IssuePlatform, C: SpamClassifier> {
    pub moderation: Arc<ModerationService<P, C>>,
    pub secret: Option<Arc<str>>,
}

// Manual impl so P and C don't need to be Clone
impl<P: IssuePlatform, C: SpamClassifier> Clone for WebhookState<P, C> {
    fn clone(&self) -> Self {
        Self {
            moderation: Arc::clone(&self.moderation),
            secret: self.secret.clone(),
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn receive<P, C>(
    State(state): State<WebhookState<P, C>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    P: IssuePlatform + 'static,
    C: SpamClassifier + 'static,
{
    if let Some(secret) = state.secret.as_deref() {
        verify_signature(
            secret.as_bytes(),
            &body,
            header(&headers, "X-Hub-Signature-256"),
        )?;
    }

    let event_name = header(&headers, "X-GitHub-Event").ok_or(WebhookError::MissingEventType)?;
    let delivery = header(&headers, "X-GitHub-Delivery")
        .unwrap_or("unknown")
        .to_string();

    match route_event(event_name, &body)? {
        Routed::Ping => Ok((StatusCode::OK, "pong")),
        Routed::Ignored => {
            tracing::debug!(event = event_name, delivery = %delivery, "Ignoring webhook event");
            Ok((StatusCode::OK, "ignored"))
        }
        Routed::Moderate(event) => {
            tracing::info!(
                delivery = %delivery,
                repo = %format!("{}/{}", event.owner, event.repo),
                issue_number = event.issue.as_ref().map(|i| i.number),
                "Received issue event"
            );

            let moderation = Arc::clone(&state.moderation);
            tokio::spawn(async move {
                let outcome = moderation.handle_issue_event(&event).await;
                tracing::debug!(
                    delivery = %delivery,
                    acted = outcome.acted(),
                    outcome = ?outcome,
                    "Moderation finished"
                );
            });

            Ok((StatusCode::ACCEPTED, "accepted"))
        }
    }
}

/// Build the router with the webhook endpoint and a health check.
pub fn router<P, C>(state: WebhookState<P, C>) -> Router
where
    P: IssuePlatform + 'static,
    C: SpamClassifier + 'static,
{
    Router::new()
        .route(WEBHOOK_PATH, post(receive::<P, C>))
        .route("/", post(receive::<P, C>))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}
