// src/message.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// Inbound payload as received, before validation.
///
/// Fields are kept as raw JSON so that a wrong type can be reported against
/// the field it belongs to instead of as a generic body error.
#[derive(Debug, Default, Deserialize)]
pub struct RawGenerateRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<Value>,
}

/// A validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub result: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

impl RawGenerateRequest {
    /// Parse a JSON body. Anything other than a JSON object is rejected.
    pub fn from_value(body: Value) -> Result<Self, ValidationError> {
        if !body.is_object() {
            return Err(ValidationError::new("body", "request body must be a JSON object"));
        }
        serde_json::from_value(body).map_err(|e| ValidationError::new("body", e.to_string()))
    }

    pub fn validate(self) -> Result<GenerateRequest, ValidationError> {
        let prompt = match self.prompt {
            None | Some(Value::Null) => {
                return Err(ValidationError::new("prompt", "prompt is required"));
            }
            Some(Value::String(s)) => s,
            Some(_) => return Err(ValidationError::new("prompt", "prompt must be a string")),
        };
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ValidationError::new("prompt", "prompt must not be empty"));
        }

        // Blank ids count as "no prior session".
        let session_id = match self.session_id {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => {
                return Err(ValidationError::new("sessionId", "sessionId must be a string"));
            }
        };

        Ok(GenerateRequest { prompt: prompt.to_string(), session_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(body: Value) -> Result<GenerateRequest, ValidationError> {
        RawGenerateRequest::from_value(body)?.validate()
    }

    #[test]
    fn accepts_prompt_only() {
        let req = validate(json!({ "prompt": "  Hello  " })).unwrap();
        assert_eq!(req.prompt, "Hello");
        assert_eq!(req.session_id, None);
    }

    #[test]
    fn keeps_session_id() {
        let req = validate(json!({ "prompt": "Continue", "sessionId": "abc" })).unwrap();
        assert_eq!(req.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn rejects_missing_or_empty_prompt() {
        for body in [
            json!({ "sessionId": "abc" }),
            json!({ "prompt": null }),
            json!({ "prompt": "" }),
            json!({ "prompt": " \n\t " }),
        ] {
            let err = validate(body).unwrap_err();
            assert_eq!(err.field, "prompt");
        }
    }

    #[test]
    fn rejects_non_string_prompt() {
        let err = validate(json!({ "prompt": 42 })).unwrap_err();
        assert_eq!(err.field, "prompt");
        assert!(err.message.contains("string"));
    }

    #[test]
    fn rejects_non_string_session_id() {
        let err = validate(json!({ "prompt": "hi", "sessionId": 7 })).unwrap_err();
        assert_eq!(err.field, "sessionId");
    }

    #[test]
    fn null_or_blank_session_id_is_absent() {
        assert_eq!(validate(json!({ "prompt": "hi", "sessionId": null })).unwrap().session_id, None);
        assert_eq!(validate(json!({ "prompt": "hi", "sessionId": "  " })).unwrap().session_id, None);
    }

    #[test]
    fn rejects_non_object_body() {
        let err = validate(json!(["prompt"])).unwrap_err();
        assert_eq!(err.field, "body");
    }

    #[test]
    fn response_uses_camel_case() {
        let resp = GenerateResponse { result: "hi".into(), session_id: "s1".into() };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({ "result": "hi", "sessionId": "s1" }));
    }
}
