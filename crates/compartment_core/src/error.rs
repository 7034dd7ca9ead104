use std::fmt;

use thiserror::Error;

/// Message shown when the stream ends or breaks before a terminal event.
pub const CONNECTION_ERROR: &str = "connection error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The upload request did not answer within the request timeout.
    Timeout,
    /// HTTP 429 from any endpoint.
    RateLimited,
    /// HTTP 413 or an explicit oversized-document error event.
    PayloadTooLarge,
    /// The progress stream failed or closed before a terminal event.
    StreamError,
    /// Explicit `{"status": "error"}` event.
    ServerReported,
    /// Caller-side input check failed.
    Validation,
    Cancelled,
    /// Another upload is still in flight on the same coordinator.
    Busy,
    HttpStatus(u16),
    InvalidResponse,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::PayloadTooLarge => write!(f, "payload too large"),
            FailureKind::StreamError => write!(f, "stream error"),
            FailureKind::ServerReported => write!(f, "server error"),
            FailureKind::Validation => write!(f, "invalid input"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::Busy => write!(f, "upload already in progress"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Failure of an upload or chat request. Chat shares the upload taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct UploadError {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "upload cancelled")
    }

    pub fn connection_lost() -> Self {
        Self::new(FailureKind::StreamError, CONNECTION_ERROR)
    }

    /// Text meant for the end user; one per failed attempt.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::Timeout => {
                "The server took too long to respond. Please try again.".to_string()
            }
            FailureKind::RateLimited => {
                "Too many requests. Please wait a while before trying again.".to_string()
            }
            FailureKind::PayloadTooLarge => {
                if self.message.is_empty() {
                    "Document is too large to process.".to_string()
                } else {
                    self.message.clone()
                }
            }
            FailureKind::StreamError => {
                "Connection error while processing the document. Please upload it again."
                    .to_string()
            }
            FailureKind::ServerReported | FailureKind::Validation => self.message.clone(),
            FailureKind::Cancelled => "Upload cancelled.".to_string(),
            FailureKind::Busy => "An upload is already in progress.".to_string(),
            FailureKind::HttpStatus(_) | FailureKind::InvalidResponse | FailureKind::Network => {
                format!("Upload failed: {}", self.message)
            }
        }
    }
}
