use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed server response: {0}")]
    Decode(String),
    #[error("not a valid file path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("{}: {source}", .path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ApiError {
    /// Error for a non-2xx response. Prefers the backend's own
    /// `{"error": ...}` text when the body carries one.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            error: Option<String>,
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                error: Some(message),
            }) => Self::Server { status, message },
            _ => Self::Status(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;

    #[test]
    fn prefers_backend_error_text() {
        let err = ApiError::from_response(400, r#"{"success": false, "error": "bad header"}"#);
        assert_eq!(err.to_string(), "bad header");
    }

    #[test]
    fn falls_back_to_status_for_non_json_bodies() {
        let err = ApiError::from_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "request failed with status 502");
    }

    #[test]
    fn falls_back_when_error_field_has_the_wrong_shape() {
        let err = ApiError::from_response(400, r#"{"error": {"file": ["Only CSV files"]}}"#);
        assert_eq!(err.to_string(), "request failed with status 400");
    }

    #[test]
    fn falls_back_when_error_field_is_missing() {
        let err = ApiError::from_response(500, r#"{"success": false}"#);
        assert_eq!(err.to_string(), "request failed with status 500");
    }
}
