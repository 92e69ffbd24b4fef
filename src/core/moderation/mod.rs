// Core moderation module - issue spam detection and the actions taken on spam.

pub mod heuristics;
pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
