use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    /// Login rejected or the appliance could not be reached. Aborts the scrape.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// The appliance answered a stat/config call with a non-zero error code.
    #[error("Nitro fetch of '{resource}' failed with errorcode {errorcode} ({severity}): {message}")]
    Fetch {
        resource: String,
        errorcode: i64,
        message: String,
        severity: String,
    },

    /// The appliance answered a stat/config call with a non-success HTTP status
    /// and no usable envelope.
    #[error("Nitro fetch of '{resource}' failed with HTTP {status}: {body}")]
    FetchStatus {
        resource: String,
        status: u16,
        body: String,
    },

    #[error("Decode error: field '{field}' has malformed value {value}")]
    Decode { field: String, value: String },

    #[error("Logout failed (HTTP {status}): {message}")]
    Logout { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Short classification used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ExporterError::Auth { .. } => "auth",
            ExporterError::Fetch { .. } | ExporterError::FetchStatus { .. } => "fetch",
            ExporterError::Decode { .. } => "decode",
            ExporterError::Logout { .. } => "logout",
            ExporterError::Http(_) => "http",
            ExporterError::Json(_) => "json",
            ExporterError::Metrics(_) => "metrics",
            ExporterError::InvalidTarget(_) => "target",
            ExporterError::Config(_) => "config",
            ExporterError::Server(_) => "server",
            ExporterError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
