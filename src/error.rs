use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("no problem statement found at {url}")]
    Structure { url: String },

    /// A batch worker died before reporting (panic or cancellation).
    #[error("worker for {url} failed: {reason}")]
    Task { url: String, reason: String },
}

impl ScrapeError {
    /// Rate limits, server errors and transport hiccups are worth another try.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Fetch { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            ScrapeError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ScrapeError::Structure { .. } | ScrapeError::Task { .. } => false,
        }
    }

    /// Short machine-friendly label, stored alongside failures.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Fetch { .. } | ScrapeError::Status { .. } => "fetch",
            ScrapeError::Structure { .. } => "structure",
            ScrapeError::Task { .. } => "task",
        }
    }
}

// ── Tests ──
