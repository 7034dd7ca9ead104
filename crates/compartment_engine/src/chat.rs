use compartment_core::{validate_text, FailureKind, UploadError};
use engine_logging::engine_debug;

use crate::settings::{ClientSettings, SettingsError};
use crate::transport::{check_status, map_reqwest_error};
use crate::types::ChatRequest;
use crate::ChatReply;

const CHAT_PATH: &str = "chat/get-response";

/// Asks questions about the uploaded document. Shares the upload error taxonomy.
#[derive(Debug, Clone)]
pub struct ChatClient {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(settings: ClientSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let client = settings.build_client()?;
        Ok(Self { settings, client })
    }

    pub async fn ask(&self, question: &str, user_id: &str) -> Result<ChatReply, UploadError> {
        validate_text(question)?;
        let url = self
            .settings
            .endpoint(CHAT_PATH)
            .map_err(|err| UploadError::new(FailureKind::Network, err.to_string()))?;

        engine_debug!("Asking {} ({} chars)", url, question.len());
        let response = self
            .client
            .post(url)
            .timeout(self.settings.chat_timeout)
            .json(&ChatRequest { question, user_id })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        response.json::<ChatReply>().await.map_err(|err| {
            if err.is_timeout() {
                map_reqwest_error(err)
            } else {
                UploadError::new(FailureKind::InvalidResponse, err.to_string())
            }
        })
    }
}
