//! Core types for the vidrelay service: configuration, the unified error
//! type, and the domain models shared by the extractor, storage, and API
//! crates.

pub mod config;
pub mod error;
pub mod models;

pub use config::{Config, ExtractionBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
