// Error handling module
// Defines the failure taxonomy surfaced to feature code

use thiserror::Error;

/// Coarse failure class used by callers to decide user-facing messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Connection-level failure, DNS error, or broken transport
    Network,

    /// The configured pipeline timeout elapsed
    Timeout,

    /// 401 that survived the single refresh-and-retry cycle
    Auth,

    /// Non-2xx server-side response (5xx)
    Server,

    /// Non-2xx client-side response (4xx other than 401)
    Client,

    /// Failure inside this component (pipeline construction, etc.)
    Internal,
}

/// Errors surfaced by `ApiClient::send`
#[derive(Error, Debug)]
pub enum HttpError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the pipeline timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Authentication failed after the retry cycle was exhausted
    #[error("authentication failed: {status} - {message}")]
    Auth { status: u16, message: String },

    /// Server-side error response
    #[error("server error: {status} - {message}")]
    Server { status: u16, message: String },

    /// Client-side error response
    #[error("client error: {status} - {message}")]
    Client { status: u16, message: String },

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError {
    /// The status class carried by this error
    pub fn status_class(&self) -> StatusClass {
        match self {
            HttpError::Network(_) => StatusClass::Network,
            HttpError::Timeout(_) => StatusClass::Timeout,
            HttpError::Auth { .. } => StatusClass::Auth,
            HttpError::Server { .. } => StatusClass::Server,
            HttpError::Client { .. } => StatusClass::Client,
            HttpError::Internal(_) => StatusClass::Internal,
        }
    }

    /// Classify a transport error from the HTTP client
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::Network(err.to_string())
        }
    }

    /// Classify a non-2xx response by status code
    pub(crate) fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        let code = status.as_u16();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            HttpError::Auth {
                status: code,
                message,
            }
        } else if status.is_server_error() {
            HttpError::Server {
                status: code,
                message,
            }
        } else {
            HttpError::Client {
                status: code,
                message,
            }
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, HttpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_messages() {
        let err = HttpError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "network error: connection refused");

        let err = HttpError::Auth {
            status: 401,
            message: "token expired".to_string(),
        };
        assert_eq!(err.to_string(), "authentication failed: 401 - token expired");

        let err = HttpError::Server {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "server error: 503 - unavailable");
    }

    #[test]
    fn test_status_classification() {
        let err = HttpError::from_status(StatusCode::UNAUTHORIZED, "expired".to_string());
        assert_eq!(err.status_class(), StatusClass::Auth);

        let err = HttpError::from_status(StatusCode::NOT_FOUND, "missing".to_string());
        assert_eq!(err.status_class(), StatusClass::Client);

        let err = HttpError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string());
        assert_eq!(err.status_class(), StatusClass::Server);

        let err = HttpError::from_status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        assert_eq!(err.status_class(), StatusClass::Client);
    }

    #[test]
    fn test_status_class_per_variant() {
        assert_eq!(
            HttpError::Timeout("deadline".to_string()).status_class(),
            StatusClass::Timeout
        );
        assert_eq!(
            HttpError::Internal(anyhow::anyhow!("bad state")).status_class(),
            StatusClass::Internal
        );
    }
}
