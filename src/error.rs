//! Error types for parley.
//!
//! Every fallible operation in the crate returns [`Result`].  Provider failures, transcript I/O
//! failures and configuration problems all share the one [`Error`] enum so that the chat loop
//! can report them uniformly.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

/// The main error type for parley.
#[derive(Clone, Debug)]
pub enum Error {
    /// The completion endpoint returned a status we do not map to a narrower variant.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error type string from the endpoint, if it sent one.
        error_type: Option<String>,
        /// Human-readable error message.
        message: String,
    },

    /// The credential was missing or rejected.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// The credential is valid but may not use the requested resource.
    Permission {
        /// Human-readable error message.
        message: String,
    },

    /// The endpoint or model was not found.
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Rate limit exceeded.
    RateLimit {
        /// Human-readable error message.
        message: String,
        /// Seconds to wait, as reported by the endpoint.
        retry_after: Option<u64>,
    },

    /// The endpoint rejected the request body.
    BadRequest {
        /// Human-readable error message.
        message: String,
        /// Parameter that caused the error.
        param: Option<String>,
    },

    /// The request timed out.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Configured timeout in seconds.
        duration: Option<f64>,
    },

    /// The endpoint could not be reached.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The endpoint returned a 500.
    InternalServer {
        /// Human-readable error message.
        message: String,
    },

    /// The endpoint is overloaded or behind a failing gateway.
    ServiceUnavailable {
        /// Human-readable error message.
        message: String,
        /// Seconds to wait, as reported by the endpoint.
        retry_after: Option<u64>,
    },

    /// JSON encoding or decoding failed.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// The HTTP client itself failed.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A value failed validation.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// A base URL could not be parsed or joined.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, error_type: Option<String>, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            error_type,
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new permission error.
    pub fn permission(message: impl Into<String>) -> Self {
        Error::Permission {
            message: message.into(),
        }
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new rate limit error.
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new bad request error.
    pub fn bad_request(message: impl Into<String>, param: Option<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
            param,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new internal server error.
    pub fn internal_server(message: impl Into<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
        }
    }

    /// Creates a new service unavailable error.
    pub fn service_unavailable(message: impl Into<String>, retry_after: Option<u64>) -> Self {
        Error::ServiceUnavailable {
            message: message.into(),
            retry_after,
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Returns true if this error is related to authentication.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is related to rate limiting.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::RateLimit { .. })
    }

    /// Returns true if this error came from reading or writing a file.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. })
    }

    /// Returns true if this error is a JSON encoding or decoding failure.
    pub fn is_serialization(&self) -> bool {
        matches!(self, Error::Serialization { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns the HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::BadRequest { .. } => Some(400),
            Error::Authentication { .. } => Some(401),
            Error::Permission { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::RateLimit { .. } => Some(429),
            Error::InternalServer { .. } => Some(500),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                error_type: Some(error_type),
                message,
            } => write!(f, "endpoint answered {status_code} ({error_type}): {message}"),
            Error::Api {
                status_code,
                message,
                ..
            } => write!(f, "endpoint answered {status_code}: {message}"),
            Error::Authentication { message } => write!(f, "credential rejected: {message}"),
            Error::Permission { message } => write!(f, "not permitted: {message}"),
            Error::NotFound { message } => write!(f, "model or endpoint not found: {message}"),
            Error::RateLimit {
                message,
                retry_after,
            } => {
                write!(f, "rate limited: {message}")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry in {secs}s)")?;
                }
                Ok(())
            }
            Error::BadRequest { message, param } => {
                write!(f, "request rejected: {message}")?;
                if let Some(param) = param {
                    write!(f, " [{param}]")?;
                }
                Ok(())
            }
            Error::Timeout { message, duration } => match duration {
                Some(secs) => write!(f, "no reply within {secs}s: {message}"),
                None => write!(f, "request timed out: {message}"),
            },
            Error::Connection { message, .. } => write!(f, "endpoint unreachable: {message}"),
            Error::InternalServer { message } => write!(f, "endpoint failed: {message}"),
            Error::ServiceUnavailable {
                message,
                retry_after,
            } => {
                write!(f, "endpoint busy: {message}")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry in {secs}s)")?;
                }
                Ok(())
            }
            Error::Serialization { message, .. } => write!(f, "bad JSON: {message}"),
            Error::Io { message, source } => write!(f, "{message}: {source}"),
            Error::HttpClient { message, .. } => write!(f, "HTTP client: {message}"),
            Error::Validation { message, param } => {
                write!(f, "invalid value: {message}")?;
                if let Some(param) = param {
                    write!(f, " [{param}]")?;
                }
                Ok(())
            }
            Error::Url { message, .. } => write!(f, "bad endpoint URL: {message}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::Serialization { source, .. }
            | Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io("I/O failed", err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(err.to_string(), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(err.to_string(), Some(err))
    }
}

/// A specialized Result type for parley operations.
pub type Result<T> = std::result::Result<T, Error>;
