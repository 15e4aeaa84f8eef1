//! HTTP API handlers for agrisync-relay

pub mod health;
pub mod signature;
pub mod slack_events;

pub use health::health_routes;
pub use slack_events::slack_events;
