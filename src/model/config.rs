use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub list: ListConfig,
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub data_dir: String,
    pub storage_key: String,
    pub auto_save_debounce_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    pub preview_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    pub scroll_off: u16,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user = match directories::ProjectDirs::from("", "", "topicpad") {
            Some(proj_dirs) => {
                let config_path = proj_dirs.config_dir().join("config.toml");
                if config_path.exists() {
                    Some(fs::read_to_string(&config_path)?)
                } else {
                    None
                }
            }
            None => None,
        };

        let mut config = Self::from_layers(user.as_deref())?;

        if config.general.data_dir.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            config.general.data_dir =
                config
                    .general
                    .data_dir
                    .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(config)
    }

    /// Built-in defaults with an optional user layer merged on top, key by key.
    pub fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Value = toml::from_str(DEFAULTS)?;
        if let Some(user) = user {
            let overlay: toml::Value = toml::from_str(user)?;
            merge_values(&mut merged, overlay);
        }
        Ok(merged.try_into()?)
    }

    /// Directory holding the storage blob and the log files.
    pub fn data_dir(&self) -> PathBuf {
        if !self.general.data_dir.trim().is_empty() {
            return PathBuf::from(&self.general.data_dir);
        }

        directories::ProjectDirs::from("", "", "topicpad")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("topicpad"))
    }

    pub fn auto_save_delay(&self) -> Duration {
        Duration::from_millis(self.general.auto_save_debounce_ms)
    }
}

fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let config = AppConfig::from_layers(None).unwrap();
        assert_eq!(config.general.storage_key, "RESEARCH_NOTEBOOK");
        assert_eq!(config.general.auto_save_debounce_ms, 400);
        assert_eq!(config.list.preview_chars, 70);
        assert_eq!(config.auto_save_delay(), Duration::from_millis(400));
    }

    #[test]
    fn user_layer_overrides_single_keys() {
        let user = "[general]\nauto_save_debounce_ms = 250\n";
        let config = AppConfig::from_layers(Some(user)).unwrap();
        assert_eq!(config.general.auto_save_debounce_ms, 250);
        assert_eq!(config.general.storage_key, "RESEARCH_NOTEBOOK");
        assert_eq!(config.editor.scroll_off, 3);
    }

    #[test]
    fn explicit_data_dir_wins() {
        let user = "[general]\ndata_dir = \"/srv/notes\"\n";
        let config = AppConfig::from_layers(Some(user)).unwrap();
        assert_eq!(config.data_dir(), PathBuf::from("/srv/notes"));
    }

    #[test]
    fn malformed_user_layer_is_an_error() {
        assert!(AppConfig::from_layers(Some("[general")).is_err());
    }
}
