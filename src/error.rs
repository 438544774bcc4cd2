use thiserror::Error;

/// Status codes the remote service uses for transient conditions.
pub const RETRYABLE_STATUSES: [u16; 3] = [429, 500, 503];

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("{context} failed after {attempts} attempts. Last error: {last}")]
    RetriesExhausted {
        context: String,
        attempts: u32,
        last: Box<Error>,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Request(e) => e.status().map(|s| s.as_u16()),
            Error::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Whether another attempt of the same call may succeed.
    ///
    /// Only 429, 500 and 503 responses qualify, plus connection failures and
    /// timeouts that never produced a status.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { status, .. } => is_retryable_status(*status),
            Error::Request(e) => e.status().is_none() && (e.is_connect() || e.is_timeout()),
            _ => false,
        }
    }

    /// Whether the failure was the server asking us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

pub type Result<T> = std::result::Result<T, Error>;
