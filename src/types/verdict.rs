//! Scoring results and error replies

use serde::{Deserialize, Serialize};

/// The externally visible result of scoring one message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringVerdict {
    pub is_fraudulent: bool,
    /// In [0, 1]. Zero unless some signal crossed the decision threshold.
    pub fraud_probability: f64,
}

/// Error body returned instead of a verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// `bad_request`, `inference`, `timeout` or `internal`
    pub kind: String,
    pub message: String,
}

impl ErrorReply {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                kind: kind.to_string(),
                message: message.into(),
            },
        }
    }
}

/// Reply payload for a scoring request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Verdict(ScoringVerdict),
    Error(ErrorReply),
}
