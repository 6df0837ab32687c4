//! Chat Fraud Scoring Pipeline
//!
//! Scores outbound chat messages with a text model and a URL model and
//! fuses the signals into one threshold-gated verdict.

pub mod config;
pub mod consumer;
pub mod error;
pub mod metrics;
pub mod models;
pub mod producer;
pub mod service;
pub mod text;
pub mod types;
pub mod url;

pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use error::{InferenceError, ModelLoadError, ScoringError};
pub use models::{Classifier, OnnxScoringEngine, ScoringEngine, ScoringLimits};
pub use producer::VerdictPublisher;
pub use service::ScoringService;
pub use types::{FraudAlert, Reply, ScoringRequest, ScoringVerdict};
