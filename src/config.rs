//! Configuration management for the scoring service

use crate::models::engine::ScoringLimits;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "CHAT_FRAUD_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
const ENV_PREFIX: &str = "CHAT_FRAUD";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject scoring requests arrive on
    #[serde(default = "default_request_subject")]
    pub request_subject: String,
    /// Subject for fraud alerts on flagged messages
    #[serde(default = "default_alert_subject")]
    pub alert_subject: String,
    /// Queue group shared by service instances
    #[serde(default)]
    pub queue_group: Option<String>,
}

fn default_request_subject() -> String {
    "chat.fraud.score".to_string()
}

fn default_alert_subject() -> String {
    "chat.fraud.alerts".to_string()
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing the ONNX artifacts
    pub models_dir: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_url_model")]
    pub url_model: String,
    /// Intra-op threads per ONNX session (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Sessions opened per artifact (default: 1)
    #[serde(default = "default_session_pool_size")]
    pub session_pool_size: usize,
}

fn default_text_model() -> String {
    "text_fraud_model.onnx".to_string()
}

fn default_url_model() -> String {
    "url_fraud_model.onnx".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

fn default_session_pool_size() -> usize {
    1
}

impl ModelsConfig {
    pub fn text_model_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.text_model)
    }

    pub fn url_model_path(&self) -> PathBuf {
        Path::new(&self.models_dir).join(&self.url_model)
    }
}

/// Scoring pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Messages scored concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// URLs scored per message; the rest are skipped
    #[serde(default = "default_max_urls")]
    pub max_urls_per_message: usize,
    /// Wall-clock budget per scoring call in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Seconds between metrics summaries, 0 disables them
    #[serde(default = "default_metrics_interval")]
    pub metrics_interval_secs: u64,
}

fn default_workers() -> usize {
    4
}

fn default_max_urls() -> usize {
    crate::models::engine::DEFAULT_MAX_URLS
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_metrics_interval() -> u64 {
    30
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_urls_per_message: default_max_urls(),
            timeout_ms: default_timeout_ms(),
            metrics_interval_secs: default_metrics_interval(),
        }
    }
}

impl PipelineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn limits(&self) -> ScoringLimits {
        ScoringLimits {
            max_urls: self.max_urls_per_message,
            budget: Some(self.timeout()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `CHAT_FRAUD_CONFIG` or `config/config.toml`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a file, with `CHAT_FRAUD__SECTION__KEY`
    /// environment variables layered on top.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path.as_ref().display()))?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: default_request_subject(),
                alert_subject: default_alert_subject(),
                queue_group: Some("chat-fraud-scoring".to_string()),
            },
            models: ModelsConfig {
                models_dir: "models".to_string(),
                text_model: default_text_model(),
                url_model: default_url_model(),
                onnx_threads: default_onnx_threads(),
                session_pool_size: default_session_pool_size(),
            },
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
