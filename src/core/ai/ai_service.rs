use super::models::{AiConfig, AiMessage};
use super::prompts::{build_user_prompt, SPAM_MODERATION_SYSTEM_PROMPT};
use crate::core::moderation::{IssueInput, ModerationDecision};
use async_trait::async_trait;
use std::error::Error;

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Sends a chat completion request and returns the first message's text.
    ///
    /// An empty string means the model produced no content.
    async fn chat_complete(
        &self,
        messages: &[AiMessage],
        config: &AiConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("{0} is not configured, cannot run spam detection")]
    MissingConfig(&'static str),

    #[error("Classification request failed: {0}")]
    Upstream(String),
}

/// Anything that can turn an issue plus heuristic signals into a decision.
///
/// `Ok(None)` means the classifier answered but the answer was unusable.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(
        &self,
        issue: &IssueInput,
        heuristic_signals: &[String],
    ) -> Result<Option<ModerationDecision>, ClassifyError>;
}

/// Credentials for the classification endpoint as read from the environment.
///
/// Both values are checked on every call rather than at startup.
#[derive(Debug, Clone, Default)]
pub struct ClassifierSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl ClassifierSettings {
    fn resolve(&self) -> Result<AiConfig, ClassifyError> {
        let api_key =
            non_empty(&self.api_key).ok_or(ClassifyError::MissingConfig("OPENAI_API_KEY"))?;
        let model = non_empty(&self.model).ok_or(ClassifyError::MissingConfig("OPENAI_MODEL"))?;

        Ok(AiConfig {
            api_key,
            model,
            // Deterministic decoding
            temperature: 0.0,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Validate the model's raw answer.
///
/// Returns `None` for empty output, invalid JSON, or a missing/non-boolean
/// `is_spam`. A non-string `reason` becomes an empty string.
pub fn parse_decision(raw: &str) -> Option<ModerationDecision> {
    if raw.trim().is_empty() {
        tracing::warn!("Model returned empty content");
        return None;
    }

    let parsed: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "Model response is not JSON, cannot parse");
            return None;
        }
    };

    let Some(is_spam) = parsed.get("is_spam").and_then(|v| v.as_bool()) else {
        tracing::warn!("Model JSON does not match the expected shape, is_spam missing or not a boolean");
        return None;
    };

    let reason = parsed
        .get("reason")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Some(ModerationDecision { is_spam, reason })
}

/// Classifier backed by a chat-completion model.
pub struct AiSpamClassifier<P: AiProvider> {
    provider: P,
    settings: ClassifierSettings,
}

impl<P: AiProvider> AiSpamClassifier<P> {
    pub fn new(provider: P, settings: ClassifierSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl<P: AiProvider> SpamClassifier for AiSpamClassifier<P> {
    async fn classify(
        &self,
        issue: &IssueInput,
        heuristic_signals: &[String],
    ) -> Result<Option<ModerationDecision>, ClassifyError> {
        let config = self.settings.resolve()?;

        let messages = [
            AiMessage::system(SPAM_MODERATION_SYSTEM_PROMPT),
            AiMessage::user(build_user_prompt(issue, heuristic_signals)),
        ];

        let raw = self
            .provider
            .chat_complete(&messages, &config)
            .await
            .map_err(|e| ClassifyError::Upstream(e.to_string()))?;

        Ok(parse_decision(&raw))
    }
}
