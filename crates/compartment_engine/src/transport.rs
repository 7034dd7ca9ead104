use bytes::Bytes;
use compartment_core::{FailureKind, UploadError};
use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::stream::{self, StreamExt};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use tokio::sync::mpsc::UnboundedSender;

use crate::settings::{ClientSettings, SettingsError};
use crate::sse::{data_stream, EventStream};
use crate::types::{ErrorBody, TaskAccepted, TextUploadRequest};
use crate::{Route, TransferTick, UploadInput};

/// The two network calls an upload makes.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends the payload and returns the task id. Reports body progress on `ticks`.
    async fn submit(
        &self,
        input: &UploadInput,
        user_id: &str,
        ticks: UnboundedSender<TransferTick>,
    ) -> Result<String, UploadError>;

    /// Opens the progress stream for a task. Dropping the stream closes the connection.
    async fn open_stream(&self, route: Route, task_id: &str) -> Result<EventStream, UploadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: ClientSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let client = settings.build_client()?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint_error(err: SettingsError) -> UploadError {
        UploadError::new(FailureKind::Network, err.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn submit(
        &self,
        input: &UploadInput,
        user_id: &str,
        ticks: UnboundedSender<TransferTick>,
    ) -> Result<String, UploadError> {
        let route = input.route();
        let url = self
            .settings
            .endpoint(route.upload_path())
            .map_err(Self::endpoint_error)?;
        let chunk_size = self.settings.chunk_size;

        let request = match input {
            UploadInput::File(file) => {
                let total = file.bytes.len() as u64;
                let body = progress_body(file.bytes.clone(), chunk_size, ticks);
                let part = Part::stream_with_length(body, total)
                    .file_name(file.name.clone())
                    .mime_str(&file.mime)
                    .map_err(|err| UploadError::new(FailureKind::Validation, err.to_string()))?;
                let form = Form::new()
                    .part("file", part)
                    .text("userId", user_id.to_string());
                self.client.post(url.clone()).multipart(form)
            }
            UploadInput::Text(content) => {
                let payload = serde_json::to_vec(&TextUploadRequest { content, user_id })
                    .map_err(|err| UploadError::new(FailureKind::Validation, err.to_string()))?;
                let total = payload.len();
                self.client
                    .post(url.clone())
                    .header(CONTENT_TYPE, "application/json")
                    .header(CONTENT_LENGTH, total)
                    .body(progress_body(Bytes::from(payload), chunk_size, ticks))
            }
        };

        engine_info!("Submitting {:?} upload to {}", route, url);
        let response = request
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;

        let accepted: TaskAccepted = response.json().await.map_err(|err| {
            if err.is_timeout() {
                map_reqwest_error(err)
            } else {
                UploadError::new(FailureKind::InvalidResponse, err.to_string())
            }
        })?;
        if accepted.task_id.trim().is_empty() {
            return Err(UploadError::new(
                FailureKind::InvalidResponse,
                "upload response carried an empty task id",
            ));
        }
        Ok(accepted.task_id)
    }

    async fn open_stream(&self, route: Route, task_id: &str) -> Result<EventStream, UploadError> {
        let url = self
            .settings
            .endpoint_with_segment(route.progress_path(), task_id)
            .map_err(Self::endpoint_error)?;
        engine_info!("Opening progress stream {}", url);

        // No overall timeout: processing time depends on the document.
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|err| {
                engine_warn!("Progress stream connect failed: {}", err);
                UploadError::connection_lost()
            })?;
        let response = match check_status(response).await {
            Ok(response) => response,
            Err(err) if err.kind == FailureKind::RateLimited => return Err(err),
            Err(err) => {
                engine_warn!("Progress stream rejected: {}", err);
                return Err(UploadError::connection_lost());
            }
        };
        Ok(data_stream(response.bytes_stream()))
    }
}

/// Streams `payload` in chunks, reporting each chunk as it is pulled by the client.
fn progress_body(
    payload: Bytes,
    chunk_size: usize,
    ticks: UnboundedSender<TransferTick>,
) -> reqwest::Body {
    let total = payload.len() as u64;
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Bytes> = (0..payload.len())
        .step_by(chunk_size)
        .map(|start| payload.slice(start..(start + chunk_size).min(payload.len())))
        .collect();
    let mut sent = 0u64;
    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        // The receiver may be gone once the coordinator stopped listening.
        let _ = ticks.send(TransferTick { sent, total });
        Ok::<Bytes, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(body)
}

/// Maps non-success statuses onto the failure taxonomy.
pub(crate) async fn check_status(response: Response) -> Result<Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_else(|| status.to_string());
    engine_debug!("Request failed with {}: {}", status, detail);
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => FailureKind::RateLimited,
        StatusCode::PAYLOAD_TOO_LARGE => FailureKind::PayloadTooLarge,
        other => FailureKind::HttpStatus(other.as_u16()),
    };
    Err(UploadError::new(kind, detail))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        return UploadError::new(FailureKind::Timeout, err.to_string());
    }
    if let Some(status) = err.status() {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return UploadError::new(FailureKind::RateLimited, err.to_string());
        }
    }
    UploadError::new(FailureKind::Network, err.to_string())
}
