//! Model allow-list guard.
//!
//! Applied at the request boundary for an authenticated caller whose
//! managed key carries an allow-list of model identifiers. The guard runs
//! before admission control and before the proxied backend is invoked.

use serde_json::{json, Value};

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allowed,
    /// The requested model is not on the caller's allow-list
    Denied { model: String },
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PolicyDecision::Allowed)
    }
}

/// Whether `model` passes the allow-list. An empty list allows every model.
pub fn model_allowed(allow_list: &[String], model: &str) -> bool {
    allow_list.is_empty() || allow_list.iter().any(|allowed| allowed == model)
}

/// Check the inbound request body against the caller's allow-list.
///
/// The requested model is read from the body's top-level `"model"` field.
/// A missing field or a non-JSON body passes: requests without a model
/// (e.g. a model listing) are not this guard's concern, and malformed
/// bodies are the downstream handler's problem.
pub fn enforce(allow_list: &[String], body: &[u8]) -> PolicyDecision {
    if allow_list.is_empty() {
        return PolicyDecision::Allowed;
    }

    let model = match serde_json::from_slice::<Value>(body) {
        Ok(value) => match value.get("model").and_then(Value::as_str) {
            Some(model) => model.to_string(),
            None => return PolicyDecision::Allowed,
        },
        Err(_) => return PolicyDecision::Allowed,
    };

    if model_allowed(allow_list, &model) {
        PolicyDecision::Allowed
    } else {
        PolicyDecision::Denied { model }
    }
}

/// Structured permission error returned on a denial.
pub fn denial_body(model: &str) -> Value {
    json!({
        "error": {
            "message": format!("Model '{}' is not allowed for this API key", model),
            "type": "permission_error",
            "code": "model_not_allowed",
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list(models: &[&str]) -> Vec<String> {
        models.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn test_empty_allow_list_admits_everything() {
        assert!(model_allowed(&[], "any-model"));
        assert_eq!(enforce(&[], br#"{"model": "any-model"}"#), PolicyDecision::Allowed);
    }

    #[test]
    fn test_listed_model_is_allowed() {
        let list = allow_list(&["gemini-pro", "gpt-4o"]);
        assert_eq!(
            enforce(&list, br#"{"model": "gpt-4o", "messages": []}"#),
            PolicyDecision::Allowed
        );
    }

    #[test]
    fn test_unlisted_model_is_denied() {
        let list = allow_list(&["gemini-pro"]);
        assert_eq!(
            enforce(&list, br#"{"model": "gpt-4o"}"#),
            PolicyDecision::Denied {
                model: "gpt-4o".to_string()
            }
        );
    }

    #[test]
    fn test_missing_model_field_passes() {
        let list = allow_list(&["gemini-pro"]);
        assert_eq!(enforce(&list, br#"{"messages": []}"#), PolicyDecision::Allowed);
    }

    #[test]
    fn test_non_json_body_passes() {
        let list = allow_list(&["gemini-pro"]);
        assert_eq!(enforce(&list, b"not json"), PolicyDecision::Allowed);
    }

    #[test]
    fn test_denial_body_shape() {
        let body = denial_body("gpt-4o");
        assert_eq!(body["error"]["type"], "permission_error");
        assert_eq!(body["error"]["code"], "model_not_allowed");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("gpt-4o"));
    }
}
