//! The `{success, data}` envelope returned to API clients.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Response body shared by every engine-backed endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Convert an engine result into a status code and JSON body.
    pub fn from_result(
        result: std::result::Result<T, RetrievalError>,
    ) -> (StatusCode, serde_json::Value) {
        let (status, response) = match result {
            Ok(data) => (StatusCode::OK, Self::ok(data)),
            Err(e) => (e.status_code(), Self::error(e.to_string())),
        };
        let body = serde_json::to_value(&response)
            .unwrap_or_else(|e| serde_json::json!({"success": false, "error": e.to_string()}));
        (status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_ok_envelope() {
        let (status, body) = ApiResponse::from_result(Ok(vec![1, 2]));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_not_found_envelope() {
        let (status, body) = ApiResponse::<()>::from_result(Err(RetrievalError::IdeaNotFound(42)));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "error": "idea not found: 42"}));
    }
}
