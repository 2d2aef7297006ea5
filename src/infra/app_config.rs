use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_INLINE_LEN: usize = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `env_logger` filter used when `RUST_LOG` is not set.
    pub log_level: Option<String>,
    /// Wrap state mutations with the debug logging middleware.
    pub debug_state_mutations: bool,
    /// Compute character-level edits for finished review blocks.
    pub inline_char_edits: bool,
    /// Lines longer than this skip character-level diffing.
    pub max_inline_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            debug_state_mutations: false,
            inline_char_edits: true,
            max_inline_len: DEFAULT_MAX_INLINE_LEN,
        }
    }
}

pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

/// Missing files yield the defaults.
pub fn load_config_from(path: &Path) -> AppConfig {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return AppConfig::default();
    };
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> AppConfig {
    match toml::from_str(contents) {
        Ok(config) => config,
        Err(err) => {
            log::warn!("Ignoring invalid config: {err}");
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig) -> std::io::Result<()> {
    save_config_to(&config_path(), config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config).unwrap_or_default();
    std::fs::write(path, contents)
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("PATCHWISE_CONFIG_PATH") {
        return PathBuf::from(path);
    }

    app_data_dir().join("config.toml")
}

fn app_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var("PATCHWISE_DATA_HOME") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = home::home_dir() {
            return home
                .join("Library")
                .join("Application Support")
                .join("Patchwise");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("Patchwise");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(xdg) = std::env::var_os("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("patchwise");
        }
        if let Some(home) = home::home_dir() {
            return home.join(".local").join("share").join("patchwise");
        }
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".patchwise")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = parse_config("debug_state_mutations = true\n");
        assert!(config.debug_state_mutations);
        assert!(config.inline_char_edits);
        assert_eq!(config.max_inline_len, DEFAULT_MAX_INLINE_LEN);
    }

    #[test]
    fn test_parse_invalid_config_falls_back() {
        let config = parse_config("max_inline_len = \"lots\"");
        assert_eq!(config.max_inline_len, DEFAULT_MAX_INLINE_LEN);
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = AppConfig {
            log_level: Some("debug".into()),
            max_inline_len: 80,
            ..Default::default()
        };
        assert_eq!(load_config_from(&path).max_inline_len, DEFAULT_MAX_INLINE_LEN);
        save_config_to(&path, &config).unwrap();

        let loaded = load_config_from(&path);
        assert_eq!(loaded.log_level.as_deref(), Some("debug"));
        assert_eq!(loaded.max_inline_len, 80);
    }
}
