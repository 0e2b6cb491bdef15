use thiserror::Error;

/// Main error type for the Vigil service
#[derive(Error, Debug)]
pub enum VgError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VgError {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            VgError::Validation(_) => 400,
            VgError::Http(HttpError::BodyTooLarge { .. }) => 413,
            VgError::Http(HttpError::HeadersTooLarge { .. }) => 431,
            VgError::Http(_) => 400,
            VgError::Config(_)
            | VgError::Io(_)
            | VgError::Serialization(_)
            | VgError::Internal(_) => 500,
        }
    }
}

/// Input validation failures for a submitted event.
///
/// Only the event id is mandatory; every other field degrades to
/// "factor not triggered" when absent or malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing eventId")]
    MissingEventId,
}

/// Wire-level failures while decoding an HTTP/1.1 request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Malformed request line: {line}")]
    MalformedRequestLine { line: String },

    #[error("Malformed header: {line}")]
    MalformedHeader { line: String },

    #[error("Invalid Content-Length: {value}")]
    InvalidContentLength { value: String },

    #[error("Unsupported transfer encoding: {encoding}")]
    UnsupportedTransferEncoding { encoding: String },

    #[error("Invalid JSON body: {message}")]
    InvalidJson { message: String },

    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Request headers exceed {limit} bytes")]
    HeadersTooLarge { limit: usize },

    #[error("Connection closed before a complete request was received")]
    ConnectionClosed,
}

/// Result type alias for Vigil operations
pub type VgResult<T> = Result<T, VgError>;

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::VgError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::VgError::Config(format!($($arg)*))
    };
}
