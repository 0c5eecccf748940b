//! MergeSense core library.
//!
//! This crate provides the foundational components for AI-assisted merge
//! conflict resolution: conflict-marker extraction, normalization of AI
//! workflow responses, confidence tiers, the webhook client, configuration,
//! and the error taxonomy.

pub mod confidence;
pub mod config;
pub mod conflict;
pub mod errors;
pub mod response;
pub mod webhook;

// Re-exports for convenience.
pub use config::AppConfig;
pub use conflict::{ConflictExtractor, ConflictRegion, ConflictResolver, Resolution};
pub use response::{normalize, ConflictResult, ResolutionStatus, ResponseNormalizer};
pub use webhook::{WebhookClient, WebhookRequest};
