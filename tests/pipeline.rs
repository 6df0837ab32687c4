//! End-to-end scoring through the public API with stand-in models.

use chat_fraud_pipeline::metrics::ScoringMetrics;
use chat_fraud_pipeline::url::UrlFeatures;
use chat_fraud_pipeline::{
    Classifier, InferenceError, Reply, ScoringEngine, ScoringError, ScoringLimits, ScoringRequest,
    ScoringService, ScoringVerdict,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Text model looking up normalized text in a table
struct TableText(HashMap<&'static str, f64>);

impl Classifier for TableText {
    type Input = str;

    fn name(&self) -> &str {
        "table-text"
    }

    fn score(&self, text: &str) -> Result<f64, InferenceError> {
        self.0.get(text).copied().ok_or_else(|| InferenceError::Output {
            model: "table-text".to_string(),
            reason: format!("no entry for {:?}", text),
        })
    }
}

/// URL model approximating a trained one with a few feature rules
struct RuleUrl;

impl Classifier for RuleUrl {
    type Input = UrlFeatures;

    fn name(&self) -> &str {
        "rule-url"
    }

    fn score(&self, f: &UrlFeatures) -> Result<f64, InferenceError> {
        let mut p: f64 = 0.1;
        if f.has_suspicious_words {
            p += 0.6;
        }
        if !f.has_https {
            p += 0.15;
        }
        Ok(p.min(1.0))
    }
}

fn engine() -> ScoringEngine<TableText, RuleUrl> {
    let table = HashMap::from([
        ("congratul free prize claim", 0.91),
        ("verifi account", 0.35),
        ("see tomorrow", 0.02),
        ("", 0.5),
    ]);
    ScoringEngine::new(TableText(table), RuleUrl, ScoringLimits::default())
}

#[test]
fn scam_text_flags_on_text_signal() {
    let verdict = engine()
        .score(&ScoringRequest::new(
            "Congratulations! You have WON a free prize, claim now at http://win.example.com",
        ))
        .unwrap();
    assert!(verdict.is_fraudulent);
    assert_eq!(verdict.fraud_probability, 0.91);
}

#[test]
fn phishing_url_flags_on_url_signal() {
    let assessment = engine()
        .assess("Verify your account now http://login-verify-account.com")
        .unwrap();

    // 0.1 + 0.6 + 0.15 from the rule model
    assert!(assessment.is_fraudulent());
    assert!((assessment.verdict.fraud_probability - 0.85).abs() < 1e-9);
    assert_eq!(assessment.triggered().count(), 1);
    assert_eq!(assessment.urls_scored, 1);
}

#[test]
fn benign_message_is_clean() {
    let verdict = engine()
        .score(&ScoringRequest::new("see you tomorrow https://docs.example.com"))
        .unwrap();
    assert_eq!(verdict, ScoringVerdict::default());
}

#[test]
fn unknown_text_surfaces_inference_error() {
    let err = engine()
        .score(&ScoringRequest::new("something the table lacks"))
        .unwrap_err();
    assert!(matches!(err, ScoringError::Inference(InferenceError::Output { .. })));
}

#[tokio::test]
async fn service_replies_with_bare_verdict_json() {
    let service = ScoringService::new(Arc::new(engine()), Arc::new(ScoringMetrics::new()));

    let processed = service
        .process(br#"{"content":"Verify your account now http://login-verify-account.com","message_id":"abc"}"#)
        .await;
    let json = serde_json::to_value(&processed.reply).unwrap();
    assert_eq!(json["is_fraudulent"], true);
    assert!(json.get("error").is_none());
    assert_eq!(processed.alert.unwrap().message_id.as_deref(), Some("abc"));

    let processed = service.process(br#"{"content":"see you tomorrow"}"#).await;
    assert_eq!(processed.reply, Reply::Verdict(ScoringVerdict::default()));
    assert!(processed.alert.is_none());
}
