use serde_json::Value;
use thiserror::Error;

/// One entry of a structured `{ errors: [...] }` backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Message(String),

    #[error("validation failed ({} errors)", .0.len())]
    Fields(Vec<FieldError>),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The backend reports failures either as `{ "message": "..." }` or as
    /// `{ "errors": [ { "field": ..., "message": ... } | "..." ] }`.
    /// Anything else falls back to the HTTP status line.
    pub fn from_body(status: u16, body: &Value) -> ApiError {
        if let Some(errors) = body.get("errors").and_then(|v| v.as_array()) {
            let list: Vec<FieldError> = errors
                .iter()
                .filter_map(|e| {
                    if let Some(msg) = e.as_str() {
                        return Some(FieldError { field: None, message: msg.to_string() });
                    }
                    let message = e
                        .get("message")
                        .or_else(|| e.get("msg"))
                        .and_then(|v| v.as_str())?
                        .to_string();
                    let field = e
                        .get("field")
                        .or_else(|| e.get("param"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());
                    Some(FieldError { field, message })
                })
                .collect();
            if !list.is_empty() {
                return ApiError::Fields(list);
            }
        }
        if let Some(msg) = body.get("message").and_then(|v| v.as_str()) {
            return ApiError::Message(msg.to_string());
        }
        ApiError::Message(format!("HTTP {}", status))
    }

    /// Messages to surface to the user, one toast each.
    pub fn toast_messages(&self) -> Vec<String> {
        match self {
            ApiError::Fields(list) => list.iter().map(|e| e.message.clone()).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_body() {
        let err = ApiError::from_body(400, &json!({ "message": "Titre requis" }));
        assert_eq!(err.toast_messages(), vec!["Titre requis".to_string()]);
    }

    #[test]
    fn test_structured_errors_one_toast_each() {
        let err = ApiError::from_body(
            422,
            &json!({ "errors": [
                { "field": "titre", "message": "Titre requis" },
                { "field": "villeDepart", "message": "Ville de départ requise" },
            ] }),
        );
        let toasts = err.toast_messages();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0], "Titre requis");
    }

    #[test]
    fn test_bare_string_errors() {
        let err = ApiError::from_body(422, &json!({ "errors": ["Champ manquant"] }));
        match err {
            ApiError::Fields(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].field, None);
            }
            other => panic!("expected Fields, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_to_status() {
        let err = ApiError::from_body(500, &json!({}));
        assert_eq!(err.to_string(), "HTTP 500");
    }
}
