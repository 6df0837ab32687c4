//! Request handling: decode, score under the wall-clock budget, build the
//! reply and the optional alert.

use crate::error::ScoringError;
use crate::metrics::ScoringMetrics;
use crate::models::classifier::Classifier;
use crate::models::engine::ScoringEngine;
use crate::types::{ErrorReply, FraudAlert, Reply, ScoringRequest};
use crate::url::UrlFeatures;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of one scoring request
#[derive(Debug)]
pub struct Processed {
    pub reply: Reply,
    pub alert: Option<FraudAlert>,
}

impl Processed {
    fn error(kind: &str, message: impl Into<String>) -> Self {
        Self {
            reply: Reply::Error(ErrorReply::new(kind, message)),
            alert: None,
        }
    }
}

pub struct ScoringService<T, U> {
    engine: Arc<ScoringEngine<T, U>>,
    metrics: Arc<ScoringMetrics>,
    budget: Option<Duration>,
}

impl<T, U> Clone for ScoringService<T, U> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            metrics: Arc::clone(&self.metrics),
            budget: self.budget,
        }
    }
}

impl<T, U> ScoringService<T, U>
where
    T: Classifier<Input = str> + 'static,
    U: Classifier<Input = UrlFeatures> + 'static,
{
    pub fn new(engine: Arc<ScoringEngine<T, U>>, metrics: Arc<ScoringMetrics>) -> Self {
        let budget = engine.limits().budget;
        Self {
            engine,
            metrics,
            budget,
        }
    }

    pub fn metrics(&self) -> &Arc<ScoringMetrics> {
        &self.metrics
    }

    /// Handle one raw request payload. Never substitutes a verdict that
    /// was not computed.
    pub async fn process(&self, payload: &[u8]) -> Processed {
        let request: ScoringRequest = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                self.metrics.record_bad_request();
                warn!(error = %e, payload_bytes = payload.len(), "Failed to decode scoring request");
                return Processed::error("bad_request", e.to_string());
            }
        };

        let ScoringRequest {
            content,
            message_id,
        } = request;
        let started = Instant::now();
        let engine = Arc::clone(&self.engine);
        let task = tokio::task::spawn_blocking(move || engine.assess(&content));

        let joined = match self.budget {
            Some(budget) => match tokio::time::timeout(budget, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    let err = ScoringError::Timeout {
                        elapsed: started.elapsed(),
                        budget,
                    };
                    return self.failed(err, message_id.as_deref());
                }
            },
            None => task.await,
        };

        let assessment = match joined {
            Ok(Ok(assessment)) => assessment,
            Ok(Err(err)) => return self.failed(err, message_id.as_deref()),
            Err(e) => {
                error!(message_id = ?message_id, error = %e, "Scoring task aborted");
                return Processed::error("internal", "scoring task aborted");
            }
        };

        let elapsed = started.elapsed();
        self.metrics.record_assessment(&assessment, elapsed);

        let alert = FraudAlert::from_assessment(&assessment, message_id.clone());
        if let Some(alert) = &alert {
            info!(
                message_id = ?message_id,
                alert_id = %alert.alert_id,
                fraud_probability = alert.fraud_probability,
                signals = ?alert.triggered_signals,
                processing_time_us = elapsed.as_micros() as u64,
                "Message flagged as fraudulent"
            );
        } else {
            debug!(
                message_id = ?message_id,
                peak_probability = assessment.peak_probability(),
                processing_time_us = elapsed.as_micros() as u64,
                "Message below threshold"
            );
        }

        Processed {
            reply: Reply::Verdict(assessment.verdict),
            alert,
        }
    }

    fn failed(&self, err: ScoringError, message_id: Option<&str>) -> Processed {
        self.metrics.record_failure(&err);
        match &err {
            ScoringError::Inference(e) => {
                error!(message_id = ?message_id, error = %e, "Inference failed")
            }
            ScoringError::Timeout { elapsed, budget } => warn!(
                message_id = ?message_id,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "Scoring timed out"
            ),
        }
        Processed::error(err.kind(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::models::engine::ScoringLimits;
    use crate::types::ScoringVerdict;
    use std::sync::atomic::Ordering;

    /// Text model scoring by keyword, optionally slow
    struct KeywordText {
        delay: Duration,
    }

    impl Classifier for KeywordText {
        type Input = str;

        fn name(&self) -> &str {
            "keyword-text"
        }

        fn score(&self, text: &str) -> Result<f64, InferenceError> {
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            Ok(if text.contains("prize") { 0.88 } else { 0.05 })
        }
    }

    /// URL model keyed on the suspicious-word flag
    struct SuspiciousUrl;

    impl Classifier for SuspiciousUrl {
        type Input = UrlFeatures;

        fn name(&self) -> &str {
            "suspicious-url"
        }

        fn score(&self, features: &UrlFeatures) -> Result<f64, InferenceError> {
            Ok(if features.has_suspicious_words { 0.93 } else { 0.2 })
        }
    }

    struct BrokenUrl;

    impl Classifier for BrokenUrl {
        type Input = UrlFeatures;

        fn name(&self) -> &str {
            "broken-url"
        }

        fn score(&self, _: &UrlFeatures) -> Result<f64, InferenceError> {
            Err(InferenceError::InvalidProbability {
                model: "broken-url".to_string(),
                value: f64::NAN,
            })
        }
    }

    fn service<U: Classifier<Input = UrlFeatures> + 'static>(
        url_model: U,
        delay: Duration,
        budget: Option<Duration>,
    ) -> ScoringService<KeywordText, U> {
        let engine = ScoringEngine::new(
            KeywordText { delay },
            url_model,
            ScoringLimits {
                max_urls: 8,
                budget,
            },
        );
        ScoringService::new(Arc::new(engine), Arc::new(ScoringMetrics::new()))
    }

    #[tokio::test]
    async fn test_flagged_message_gets_alert() {
        let svc = service(SuspiciousUrl, Duration::ZERO, Some(Duration::from_secs(5)));
        let payload = br#"{"content":"hi, log in at https://secure-login.example.com","message_id":"m-1"}"#;

        let processed = svc.process(payload).await;
        assert_eq!(
            processed.reply,
            Reply::Verdict(ScoringVerdict {
                is_fraudulent: true,
                fraud_probability: 0.93
            })
        );
        let alert = processed.alert.unwrap();
        assert_eq!(alert.message_id.as_deref(), Some("m-1"));
        assert_eq!(alert.urls_scored, 1);
        assert_eq!(svc.metrics().messages_flagged.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_clean_message_has_no_alert() {
        let svc = service(SuspiciousUrl, Duration::ZERO, None);
        let processed = svc
            .process(br#"{"content":"lunch at noon? menu at http://cafe.example.com"}"#)
            .await;
        assert_eq!(processed.reply, Reply::Verdict(ScoringVerdict::default()));
        assert!(processed.alert.is_none());
        assert_eq!(svc.metrics().messages_scored.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_bad_request() {
        let svc = service(SuspiciousUrl, Duration::ZERO, None);
        let processed = svc.process(b"not json").await;
        match processed.reply {
            Reply::Error(reply) => assert_eq!(reply.error.kind, "bad_request"),
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(svc.metrics().bad_requests.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_non_string_content_scores_as_empty() {
        let svc = service(SuspiciousUrl, Duration::ZERO, None);
        let payloads: [&[u8]; 3] = [br#"{"content":42}"#, br#"{"content":null}"#, b"{}"];
        for payload in payloads {
            let processed = svc.process(payload).await;
            assert_eq!(processed.reply, Reply::Verdict(ScoringVerdict::default()));
        }
        assert_eq!(svc.metrics().messages_scored.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_inference_failure_reply() {
        let svc = service(BrokenUrl, Duration::ZERO, None);
        let processed = svc
            .process(br#"{"content":"claim your prize http://x.example.com"}"#)
            .await;
        match processed.reply {
            Reply::Error(reply) => assert_eq!(reply.error.kind, "inference"),
            other => panic!("unexpected reply {:?}", other),
        }
        assert!(processed.alert.is_none());
        assert_eq!(svc.metrics().inference_failures.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_slow_scoring_times_out() {
        let svc = service(
            SuspiciousUrl,
            Duration::from_millis(300),
            Some(Duration::from_millis(20)),
        );
        let processed = svc.process(br#"{"content":"you won a prize"}"#).await;
        match processed.reply {
            Reply::Error(reply) => assert_eq!(reply.error.kind, "timeout"),
            other => panic!("unexpected reply {:?}", other),
        }
        assert_eq!(svc.metrics().timeouts.load(Ordering::Relaxed), 1);
    }
}
