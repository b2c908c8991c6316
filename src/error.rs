//! Error handling for the aquarium dashboard crate.

/// A specialized `Result` type for dashboard operations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// The main error type for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },

    /// The backend answered `success: false`
    #[error("{0}")]
    BackendFailure(String),

    /// The status response carried no `data` object
    #[error("Backend response missing data")]
    MissingData,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// `start()` was called while the poll loop was already running
    #[error("poll loop is already running")]
    AlreadyRunning,
}

impl DashboardError {
    /// Create a new backend failure error
    pub fn backend_failure(msg: impl Into<String>) -> Self {
        Self::BackendFailure(msg.into())
    }

    /// Create a new HTTP status error
    pub fn http_status(status: u16) -> Self {
        Self::Http { status }
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }
}
