use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ApiError {
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("not logged in")]
    NotAuthenticated,

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// Normalizes a non-success response. The body's `error`, `detail` or
    /// `message` string wins (in that order); otherwise a default message for
    /// the status is used.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let payload = serde_json::from_slice::<Value>(body).ok();
        let server_message = payload.as_ref().and_then(server_message);
        let code = payload
            .as_ref()
            .and_then(|value| value.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let message = server_message.unwrap_or_else(|| default_message(status));

        if status == 401 {
            return ApiError::Unauthorized(message);
        }

        ApiError::Http {
            status,
            message,
            code,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthorized(_) => Some(401),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::NotAuthenticated)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400) | Some(422))
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status >= 500)
    }

    /// Message suitable for an inline banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } | ApiError::Unauthorized(message) => message.clone(),
            ApiError::NotAuthenticated => {
                "You are not logged in. Run `taskdeck auth login` first.".to_string()
            }
            ApiError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Decode(detail) => format!("The server sent an unexpected response: {detail}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

fn server_message(payload: &Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn default_message(status: u16) -> String {
    match status {
        400 => "Invalid data provided".to_string(),
        401 => "Not authorized. Please log in again".to_string(),
        403 => "Access denied".to_string(),
        404 => "Resource not found".to_string(),
        409 => "Conflict: resource already exists".to_string(),
        422 => "Validation failed".to_string(),
        500 => "Internal server error".to_string(),
        other => {
            let reason = StatusCode::from_u16(other)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("Unknown error");
            format!("Error {other}: {reason}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_response_prefers_error_then_detail_then_message() {
        let err = ApiError::from_response(
            400,
            br#"{"message": "third", "detail": "second", "error": "first"}"#,
        );
        assert_eq!(err.to_string(), "first");

        let err = ApiError::from_response(400, br#"{"message": "third", "detail": "second"}"#);
        assert_eq!(err.to_string(), "second");

        let err = ApiError::from_response(400, br#"{"message": "third"}"#);
        assert_eq!(err.to_string(), "third");
    }

    #[test]
    fn from_response_falls_back_to_status_message() {
        let err = ApiError::from_response(404, b"");
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Resource not found");

        let err = ApiError::from_response(503, b"<html>down</html>");
        assert!(err.is_server_error());
        assert_eq!(err.user_message(), "Error 503: Service Unavailable");
    }

    #[test]
    fn from_response_ignores_non_string_detail() {
        let err = ApiError::from_response(422, br#"{"detail": [{"loc": ["body", "title"]}]}"#);
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "Validation failed");
    }

    #[test]
    fn from_response_keeps_error_code() {
        let err = ApiError::from_response(409, br#"{"error": "email taken", "code": "DUPLICATE"}"#);
        assert!(err.is_conflict());
        assert_eq!(
            err,
            ApiError::Http {
                status: 409,
                message: "email taken".to_string(),
                code: Some("DUPLICATE".to_string()),
            }
        );
    }

    #[test]
    fn unauthorized_status_maps_to_unauthorized_variant() {
        let err = ApiError::from_response(401, br#"{"detail": "Invalid credentials"}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.user_message(), "Invalid credentials");
    }
}
