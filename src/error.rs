// Error types shared by the API client, the token manager and the portal
// endpoints. Every failure a request can hit ends up as one `ApiError`, so the
// UI only has to print `err.to_string()` and carry on.

use reqwest::StatusCode;

/// Message shown when a request was sent but nothing came back.
pub const NETWORK_ERROR: &str = "Network error - please check your connection";

/// Fallback when the server rejects a request without saying why.
pub const GENERIC_ERROR: &str = "An error occurred";

/// A failed API call.
///
/// `Clone` is required because a single refresh result is handed to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn network() -> Self {
        ApiError::Transport(NETWORK_ERROR.to_string())
    }

    pub fn server(status: StatusCode, message: Option<String>) -> Self {
        ApiError::Server {
            status: status.as_u16(),
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| GENERIC_ERROR.to_string()),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Server { status: 401, .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            tracing::debug!("transport failure: {err}");
            ApiError::network()
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_falls_back_to_generic_message() {
        let err = ApiError::server(StatusCode::BAD_REQUEST, None);
        assert_eq!(err.to_string(), GENERIC_ERROR);

        let err = ApiError::server(StatusCode::BAD_REQUEST, Some("  ".into()));
        assert_eq!(err.to_string(), GENERIC_ERROR);
    }

    #[test]
    fn server_error_keeps_message_verbatim() {
        let err = ApiError::server(StatusCode::NOT_FOUND, Some("plugin not found".into()));
        assert_eq!(err.to_string(), "plugin not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_is_detected_by_status() {
        let err = ApiError::server(StatusCode::UNAUTHORIZED, Some("expired".into()));
        assert!(err.is_unauthorized());
        assert!(!ApiError::network().is_unauthorized());
        assert_eq!(ApiError::network().to_string(), NETWORK_ERROR);
    }
}
