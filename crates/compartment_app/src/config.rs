use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use compartment_engine::{AtomicFileWriter, ClientSettings};
use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILENAME: &str = "compartment.ron";
const STATE_FILENAME: &str = ".compartment_state.ron";

pub const ENV_API_URL: &str = "COMPARTMENT_API_URL";
pub const ENV_USER_ID: &str = "COMPARTMENT_USER_ID";
pub const ENV_OUTPUT_DIR: &str = "COMPARTMENT_OUTPUT_DIR";

/// Shell configuration: `compartment.ron` plus environment overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub user_id: Option<String>,
    pub output_dir: PathBuf,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: ClientSettings::default().base_url,
            user_id: None,
            output_dir: PathBuf::from("output"),
            log_to_file: true,
        }
    }
}

/// Identity kept across runs when none is configured.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    user_id: String,
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {path:?}"));
            }
        };
        ron::from_str(&content).with_context(|| format!("failed to parse config {path:?}"))
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(ENV_API_URL) {
            self.base_url = url;
        }
        if let Some(user_id) = lookup(ENV_USER_ID) {
            self.user_id = Some(user_id);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::with_base_url(self.base_url.clone())
    }

    /// Configured user id, else the persisted one, else a fresh v4 uuid that is persisted.
    pub fn resolve_user_id(&self) -> anyhow::Result<String> {
        if let Some(user_id) = self.user_id.as_deref().map(str::trim) {
            if !user_id.is_empty() {
                return Ok(user_id.to_string());
            }
        }
        if let Some(user_id) = load_persisted_user_id(&self.output_dir) {
            return Ok(user_id);
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        let content = ron::ser::to_string_pretty(
            &PersistedState {
                user_id: user_id.clone(),
            },
            ron::ser::PrettyConfig::new(),
        )
        .context("failed to serialize state")?;
        AtomicFileWriter::new(self.output_dir.clone())
            .write(STATE_FILENAME, &content)
            .with_context(|| format!("failed to persist user id in {:?}", self.output_dir))?;
        engine_info!("Generated user id {}", user_id);
        Ok(user_id)
    }
}

fn load_persisted_user_id(output_dir: &Path) -> Option<String> {
    let path = output_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            engine_warn!("Failed to read persisted state from {:?}: {}", path, err);
            return None;
        }
    };
    match ron::from_str::<PersistedState>(&content) {
        Ok(state) if !state.user_id.trim().is_empty() => Some(state.user_id),
        Ok(_) => None,
        Err(err) => {
            engine_warn!("Failed to parse persisted state from {:?}: {}", path, err);
            None
        }
    }
}
