//! Alert published for messages judged fraudulent

use crate::models::aggregator::Assessment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raised once per flagged message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAlert {
    /// Unique alert identifier
    pub alert_id: String,

    /// Caller's message id, when one was supplied
    pub message_id: Option<String>,

    /// Reported fraud probability (0.0 - 1.0)
    pub fraud_probability: f64,

    /// Signals that crossed the threshold, e.g. `url[0]:0.93 http://...`
    pub triggered_signals: Vec<String>,

    /// URLs found in the message
    pub urls_found: usize,

    /// URLs actually scored
    pub urls_scored: usize,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudAlert {
    /// Build an alert from a fraudulent assessment. Returns `None` when the
    /// message was not flagged.
    pub fn from_assessment(assessment: &Assessment, message_id: Option<String>) -> Option<Self> {
        if !assessment.is_fraudulent() {
            return None;
        }

        Some(Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            message_id,
            fraud_probability: assessment.verdict.fraud_probability,
            triggered_signals: assessment.triggered().map(|s| s.to_string()).collect(),
            urls_found: assessment.urls_found,
            urls_scored: assessment.urls_scored,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aggregator::{SignalSource, VerdictAggregator};

    #[test]
    fn test_alert_only_for_flagged() {
        let mut clean = VerdictAggregator::new();
        clean.observe(SignalSource::Text, 0.2);
        assert!(FraudAlert::from_assessment(&clean.finish(0, 0), None).is_none());

        let mut flagged = VerdictAggregator::new();
        flagged.observe(SignalSource::Text, 0.4);
        flagged.observe(
            SignalSource::Url {
                index: 0,
                url: "http://login.example.com".to_string(),
            },
            0.91,
        );
        let alert = FraudAlert::from_assessment(&flagged.finish(1, 1), Some("m-7".to_string()))
            .unwrap();

        assert_eq!(alert.message_id.as_deref(), Some("m-7"));
        assert_eq!(alert.fraud_probability, 0.91);
        assert_eq!(alert.triggered_signals, vec!["url[0]:0.91 http://login.example.com"]);
    }

    #[test]
    fn test_alert_serialization() {
        let mut flagged = VerdictAggregator::new();
        flagged.observe(SignalSource::Text, 0.8);
        let alert = FraudAlert::from_assessment(&flagged.finish(0, 0), None).unwrap();

        let json = serde_json::to_string(&alert).unwrap();
        let deserialized: FraudAlert = serde_json::from_str(&json).unwrap();

        assert_eq!(alert.alert_id, deserialized.alert_id);
        assert_eq!(alert.fraud_probability, deserialized.fraud_probability);
        assert_eq!(deserialized.triggered_signals, vec!["text:0.80"]);
    }
}
