use std::path::PathBuf;

/// Result type alias for TES client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TES client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure: server unreachable, connection reset, request timeout
    #[error("connection to '{endpoint}' failed: {message}")]
    Connection { endpoint: String, message: String },

    /// The server answered, but the body could not be understood
    #[error("malformed response from '{endpoint}': {message}")]
    Protocol { endpoint: String, message: String },

    /// The server answered with a status the operation does not expect
    #[error("'{endpoint}' returned HTTP {status}: {body}")]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The task document was rejected, locally or by the server
    #[error("invalid task: {message}")]
    Validation { message: String },

    /// The job id is unknown to the server
    #[error("job '{id}' not found")]
    NotFound { id: String },

    /// Storage URI with a scheme no backend handles
    #[error("unsupported storage scheme '{scheme}' in '{uri}'")]
    UnsupportedScheme { uri: String, scheme: String },

    /// Storage backend failure
    #[error("transfer failed for '{uri}': {message}")]
    Transfer {
        uri: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a connection error
    #[must_use]
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a protocol error
    #[must_use]
    pub fn protocol(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Protocol {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create an unexpected status error
    #[must_use]
    pub fn unexpected_status(
        endpoint: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Error::UnexpectedStatus {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound { id: id.into() }
    }

    /// Create an unsupported scheme error
    #[must_use]
    pub fn unsupported_scheme(uri: impl Into<String>, scheme: impl Into<String>) -> Self {
        Error::UnsupportedScheme {
            uri: uri.into(),
            scheme: scheme.into(),
        }
    }

    /// Create a transfer error
    #[must_use]
    pub fn transfer(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transfer {
            uri: uri.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a transfer error with a source error
    #[must_use]
    pub fn transfer_with_source(
        uri: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Transfer {
            uri: uri.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Whether the failure happened before the server could answer
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", message.into(), base_error),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", f(), base_error),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("b9a7");
        assert_eq!(err.to_string(), "job 'b9a7' not found");

        let err = Error::unsupported_scheme("ftp://host/file", "ftp");
        assert_eq!(
            err.to_string(),
            "unsupported storage scheme 'ftp' in 'ftp://host/file'"
        );

        let err = Error::unexpected_status("http://localhost:8000/v1/jobs", 503, "busy");
        assert_eq!(
            err.to_string(),
            "'http://localhost:8000/v1/jobs' returned HTTP 503: busy"
        );
    }

    #[test]
    fn test_context_wraps_into_configuration() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = result.context("reading config").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("reading config"));
    }

    #[test]
    fn test_transfer_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::transfer_with_source("s3://bucket/key", "upload failed", io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_connection());
    }
}
