//! Scoring request as sent by the message-send collaborator

use serde::{Deserialize, Deserializer, Serialize};

/// A message to score before it is stored or delivered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    /// Raw message text. Non-string values decode as empty text.
    #[serde(default, deserialize_with = "lenient_string")]
    pub content: String,

    /// Caller's message id, echoed in alerts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl ScoringRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }
}

/// Accept any JSON value; only strings carry content.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => text,
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_content() {
        let request: ScoringRequest =
            serde_json::from_str(r#"{"content": "hi there", "message_id": "m-1"}"#).unwrap();
        assert_eq!(request, ScoringRequest::new("hi there").with_message_id("m-1"));
    }

    #[test]
    fn test_non_string_content_is_empty() {
        for body in [
            r#"{"content": 42}"#,
            r#"{"content": null}"#,
            r#"{"content": ["a", "b"]}"#,
            r#"{"content": {"text": "x"}}"#,
            r#"{}"#,
        ] {
            let request: ScoringRequest = serde_json::from_str(body).unwrap();
            assert_eq!(request.content, "", "body: {}", body);
        }
    }

    #[test]
    fn test_serialization_omits_missing_id() {
        let json = serde_json::to_string(&ScoringRequest::new("x")).unwrap();
        assert_eq!(json, r#"{"content":"x"}"#);
    }
}
