use std::io;
use std::path::Path;

use bytes::Bytes;
use compartment_core::{guess_mime, validate_document, validate_text, UploadError};
use serde::{Deserialize, Serialize};

/// Which backend route family handles an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Document,
    Text,
}

impl Route {
    pub(crate) fn upload_path(self) -> &'static str {
        match self {
            Route::Document => "document/upload",
            Route::Text => "text/upload-text",
        }
    }

    pub(crate) fn progress_path(self) -> &'static str {
        match self {
            Route::Document => "document/progress",
            Route::Text => "text/progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl DocumentFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = guess_mime(&name).to_string();
        Self {
            name,
            mime,
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
            .to_string();
        Ok(Self::new(name, bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadInput {
    File(DocumentFile),
    Text(String),
}

impl UploadInput {
    pub fn route(&self) -> Route {
        match self {
            UploadInput::File(_) => Route::Document,
            UploadInput::Text(_) => Route::Text,
        }
    }

    pub fn payload_len(&self) -> u64 {
        match self {
            UploadInput::File(file) => file.bytes.len() as u64,
            UploadInput::Text(text) => text.len() as u64,
        }
    }

    /// Caller-side checks; the coordinator itself does not re-validate.
    pub fn validate(&self) -> Result<(), UploadError> {
        match self {
            UploadInput::File(file) => {
                validate_document(&file.name, Some(&file.mime), file.bytes.len())
            }
            UploadInput::Text(text) => validate_text(text),
        }
    }
}

/// Body bytes handed to the transport so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferTick {
    pub sent: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskAccepted {
    #[serde(rename = "taskId")]
    pub(crate) task_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextUploadRequest<'a> {
    pub(crate) content: &'a str,
    #[serde(rename = "userId")]
    pub(crate) user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub(crate) question: &'a str,
    #[serde(rename = "userId")]
    pub(crate) user_id: &'a str,
}

/// FastAPI-style `{"detail": ...}` error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub(crate) detail: Option<String>,
}
