pub mod ai_service;
pub mod models;
pub mod prompts;

pub use ai_service::{AiProvider, AiSpamClassifier, ClassifierSettings, SpamClassifier};
pub use models::{AiConfig, AiMessage};
