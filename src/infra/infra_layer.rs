// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "github/mod.rs"]
pub mod github;

#[path = "ai/mod.rs"]
pub mod ai;
