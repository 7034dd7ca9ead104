use std::time::Duration;

use compartment_core::ProgressTimings;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Bound on the upload request; processing itself is tracked on the stream.
    pub request_timeout: Duration,
    pub chat_timeout: Duration,
    /// Size of the body chunks that drive transfer progress.
    pub chunk_size: usize,
    pub timings: ProgressTimings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(7),
            chat_timeout: Duration::from_secs(60),
            chunk_size: 16 * 1024,
            timings: ProgressTimings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl ClientSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.base().map(|_| ())
    }

    /// Resolves `path` (relative, no leading slash) against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, SettingsError> {
        self.base()?
            .join(path.trim_start_matches('/'))
            .map_err(|err| self.invalid(err.to_string()))
    }

    /// Like [`Self::endpoint`] with `segment` appended as one escaped path segment.
    pub fn endpoint_with_segment(&self, path: &str, segment: &str) -> Result<Url, SettingsError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| self.invalid("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    pub(crate) fn build_client(&self) -> Result<reqwest::Client, SettingsError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|err| SettingsError::Client(err.to_string()))
    }

    fn base(&self) -> Result<Url, SettingsError> {
        let mut base = Url::parse(&self.base_url).map_err(|err| self.invalid(err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(self.invalid(format!("unsupported scheme {}", base.scheme())));
        }
        // Without a trailing slash `join` would replace the last path segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    fn invalid(&self, reason: String) -> SettingsError {
        SettingsError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientSettings;

    #[test]
    fn endpoints_resolve_under_base_path() {
        let settings = ClientSettings::with_base_url("http://example.com/api");
        assert_eq!(
            settings.endpoint("/document/upload").unwrap().as_str(),
            "http://example.com/api/document/upload"
        );
    }

    #[test]
    fn task_segment_is_escaped() {
        let settings = ClientSettings::default();
        assert_eq!(
            settings
                .endpoint_with_segment("text/progress", "a b/c")
                .unwrap()
                .as_str(),
            "http://localhost:5000/text/progress/a%20b%2Fc"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(ClientSettings::with_base_url("ftp://example.com").validate().is_err());
        assert!(ClientSettings::with_base_url("not a url").validate().is_err());
    }
}
