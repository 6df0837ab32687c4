//! Threshold-gated fusion of per-signal fraud probabilities

use crate::types::verdict::ScoringVerdict;
use serde::Serialize;
use std::fmt;

/// Probability a signal must exceed (strictly) to count as fraud evidence.
/// Shared by the text and URL signals.
pub const DECISION_THRESHOLD: f64 = 0.7;

/// Where a probability came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SignalSource {
    Text,
    Url { index: usize, url: String },
}

/// One computed classifier probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub source: SignalSource,
    pub probability: f64,
    /// Whether the signal crossed the threshold and entered the verdict
    pub counted: bool,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            SignalSource::Text => write!(f, "text:{:.2}", self.probability),
            SignalSource::Url { index, url } => {
                write!(f, "url[{}]:{:.2} {}", index, self.probability, url)
            }
        }
    }
}

/// Verdict plus everything that went into it
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub verdict: ScoringVerdict,
    pub signals: Vec<Signal>,
    pub urls_found: usize,
    pub urls_scored: usize,
}

impl Assessment {
    pub fn is_fraudulent(&self) -> bool {
        self.verdict.is_fraudulent
    }

    /// Signals that contributed to the verdict
    pub fn triggered(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.counted)
    }

    /// Largest probability computed, counted or not
    pub fn peak_probability(&self) -> f64 {
        self.signals
            .iter()
            .map(|s| s.probability)
            .fold(0.0, f64::max)
    }

    pub fn urls_truncated(&self) -> bool {
        self.urls_scored < self.urls_found
    }
}

/// Folds signals into a verdict.
///
/// Only signals above [`DECISION_THRESHOLD`] set the flag or move the
/// reported probability, which is the maximum over those signals. A message
/// whose signals all sit at or below the threshold reports `0.0`.
#[derive(Debug, Default)]
pub struct VerdictAggregator {
    is_fraudulent: bool,
    fraud_probability: f64,
    signals: Vec<Signal>,
}

impl VerdictAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signal and report whether it counted.
    pub fn observe(&mut self, source: SignalSource, probability: f64) -> bool {
        let counted = probability > DECISION_THRESHOLD;
        if counted {
            self.is_fraudulent = true;
            self.fraud_probability = self.fraud_probability.max(probability);
        }
        self.signals.push(Signal {
            source,
            probability,
            counted,
        });
        counted
    }

    pub fn verdict(&self) -> ScoringVerdict {
        ScoringVerdict {
            is_fraudulent: self.is_fraudulent,
            fraud_probability: self.fraud_probability,
        }
    }

    pub fn finish(self, urls_found: usize, urls_scored: usize) -> Assessment {
        Assessment {
            verdict: self.verdict(),
            signals: self.signals,
            urls_found,
            urls_scored,
        }
    }
}
