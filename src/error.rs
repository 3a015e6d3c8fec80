//! Error handling for the sensor panel crate.

/// A specialized `Result` type for sensor panel operations.
pub type Result<T> = std::result::Result<T, SensorError>;

/// The main error type for sampling and serving operations.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pseudo-file or command output could not be parsed
    #[error("Failed to parse sensor data: {0}")]
    ParseError(String),

    /// The hardware-monitoring command failed
    #[error("Command error: {0}")]
    Command(String),

    /// JSON decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No async runtime available to host a sampler task
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SensorError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a new command error
    pub fn command_error(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }

    /// Create a new runtime error
    pub fn runtime_error(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
