//! User settings stored as settings.json in the app data directory

use crate::constants::{DEFAULT_MODEL, OLLAMA_BASE_URL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window geometry
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,

    // Inference endpoint
    pub ollama_url: Option<String>,
    pub model: String,
    pub stream_responses: bool,

    // Cloud project configuration
    pub cloud_api_key: Option<String>,
    pub cloud_project: Option<String>,

    // Login
    pub remember_login: bool,
    pub saved_login: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_x: None,
            window_y: None,
            window_w: None,
            window_h: None,
            ollama_url: None,
            model: DEFAULT_MODEL.to_string(),
            stream_responses: true,
            cloud_api_key: None,
            cloud_project: None,
            remember_login: false,
            saved_login: None,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("settings.json");
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join("settings.json");
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    pub fn ollama_url_or_default(&self) -> String {
        self.ollama_url
            .clone()
            .unwrap_or_else(|| OLLAMA_BASE_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path());
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert!(settings.stream_responses);
        assert!(!settings.remember_login);
        assert_eq!(settings.ollama_url_or_default(), OLLAMA_BASE_URL);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let settings = Settings::load(dir.path());
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.ollama_url = Some("http://10.0.0.5:11434".to_string());
        settings.model = "mistral:7b".to_string();
        settings.remember_login = true;
        settings.saved_login = Some("maria".to_string());
        settings.save(dir.path());

        let loaded = Settings::load(dir.path());
        assert_eq!(loaded.ollama_url.as_deref(), Some("http://10.0.0.5:11434"));
        assert_eq!(loaded.model, "mistral:7b");
        assert!(loaded.remember_login);
        assert_eq!(loaded.saved_login.as_deref(), Some("maria"));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.json"),
            r#"{"model": "llama3:70b", "some_future_field": 42}"#,
        )
        .unwrap();
        let loaded = Settings::load(dir.path());
        assert_eq!(loaded.model, "llama3:70b");
    }
}
