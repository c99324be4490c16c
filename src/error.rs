// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // Upstream replied with a JSON content-type but the body did not parse.
    // Replayed at the upstream's own status code.
    UpstreamParse { status: u16, details: String },

    // Upstream replied with a non-JSON content-type.
    // Replayed at the upstream's own status code.
    UpstreamNotJson { status: u16, details: String },

    // 500 Internal Server Error (anything thrown inside the proxy itself)
    Proxy(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::UpstreamParse { status, .. } => *status,
            ApiError::UpstreamNotJson { status, .. } => *status,
            ApiError::Proxy(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::UpstreamParse { .. } => "Invalid JSON response",
            ApiError::UpstreamNotJson { .. } => "Non-JSON response from backend",
            ApiError::Proxy(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::UpstreamParse { .. } => "PARSE_ERROR",
            ApiError::UpstreamNotJson { .. } => "INVALID_RESPONSE",
            ApiError::Proxy(_) => "PROXY_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to the canonical error envelope
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "code": self.error_code(),
            "message": self.message(),
        });

        match self {
            ApiError::UpstreamParse { details, .. } | ApiError::UpstreamNotJson { details, .. } => {
                error["details"] = json!(details);
            }
            _ => {}
        }

        json!({
            "success": false,
            "error": error,
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream_parse(status: u16, details: impl Into<String>) -> Self {
        ApiError::UpstreamParse { status, details: details.into() }
    }

    pub fn upstream_not_json(status: u16, details: impl Into<String>) -> Self {
        ApiError::UpstreamNotJson { status, details: details.into() }
    }

    pub fn proxy(message: impl Into<String>) -> Self {
        ApiError::Proxy(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_keep_upstream_status() {
        let err = ApiError::upstream_not_json(502, "<html>Error</html>");
        assert_eq!(err.status_code(), 502);
        assert_eq!(err.error_code(), "INVALID_RESPONSE");

        let body = err.to_json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"]["details"], json!("<html>Error</html>"));
    }

    #[test]
    fn proxy_error_is_500_with_message() {
        let err = ApiError::proxy("connection refused");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_json()["error"]["code"], json!("PROXY_ERROR"));
        assert_eq!(err.to_json()["error"]["message"], json!("connection refused"));
    }
}
