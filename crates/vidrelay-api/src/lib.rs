//! HTTP service for the vidrelay download-and-relay pipeline.
//!
//! Exposed as a library so integration tests can build the router with an
//! injected (fake) extraction provider.

pub mod api_doc;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
