//! Error types for model loading, inference and scoring

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to bring a model artifact up at startup. Always fatal.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact `{model}` not found at {}", path.display())]
    NotFound { model: String, path: PathBuf },

    #[error("failed to open ONNX session for `{model}`: {reason}")]
    Session { model: String, reason: String },

    #[error("model `{model}` has an incompatible input schema: {reason}")]
    Schema { model: String, reason: String },
}

/// Failure of a single classifier invocation.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference failed for `{model}`: {source}")]
    Runtime {
        model: String,
        #[source]
        source: ort::Error,
    },

    #[error("unusable output from `{model}`: {reason}")]
    Output { model: String, reason: String },

    #[error("`{model}` returned probability {value} outside [0, 1]")]
    InvalidProbability { model: String, value: f64 },

    #[error("no session available for `{model}` (empty session pool)")]
    Unavailable { model: String },
}

impl InferenceError {
    pub(crate) fn runtime(model: &str, source: ort::Error) -> Self {
        Self::Runtime {
            model: model.to_string(),
            source,
        }
    }

    pub(crate) fn output(model: &str, reason: impl Into<String>) -> Self {
        Self::Output {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Error returned to callers of the scoring pipeline.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("scoring exceeded its {budget:?} budget after {elapsed:?}")]
    Timeout { elapsed: Duration, budget: Duration },
}

impl ScoringError {
    /// Short machine-readable kind used in error replies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::Inference(_) => "inference",
            ScoringError::Timeout { .. } => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let timeout = ScoringError::Timeout {
            elapsed: Duration::from_millis(1200),
            budget: Duration::from_millis(1000),
        };
        assert_eq!(timeout.kind(), "timeout");

        let inference: ScoringError = InferenceError::output("url", "empty output").into();
        assert_eq!(inference.kind(), "inference");
        assert!(inference.to_string().contains("empty output"));
    }
}
