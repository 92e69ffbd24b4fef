// Webhook layer - inbound GitHub deliveries and the HTTP server.

#[path = "error.rs"]
pub mod error;

#[path = "events.rs"]
pub mod events;

#[path = "signature.rs"]
pub mod signature;

#[path = "server.rs"]
pub mod server;

pub use server::{router, WebhookState};
