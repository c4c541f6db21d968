//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::convert::DEFAULT_ENGINE;
use super::scroll_spy::DEFAULT_LOOKAHEAD;

/// Maximum number of entries kept in the recent files list
const MAX_RECENT_FILES: usize = 10;

/// Display theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        }
    }
}

/// View mode for the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Editor,
    #[default]
    Preview,
    Split,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Theme (light/dark)
    pub theme: Theme,
    /// Markdown engine loaded at startup
    pub engine: String,
    pub view_mode: ViewMode,
    /// Show the table of contents panel
    pub show_toc: bool,
    /// Scroll-spy lookahead in logical pixels
    pub lookahead: f32,
    /// Reload the open file when it changes on disk
    pub watch_file: bool,
    /// Recently opened files, newest first
    pub recent_files: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            engine: DEFAULT_ENGINE.to_string(),
            view_mode: ViewMode::default(),
            show_toc: true,
            lookahead: DEFAULT_LOOKAHEAD,
            watch_file: true,
            recent_files: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "mdpreview", "MdPreview")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Add a file to recent files
    pub fn add_recent_file(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_files.retain(|p| p != &path);
        // Add to front
        self.recent_files.insert(0, path);
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "theme": "light" }"#).unwrap();
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.engine, DEFAULT_ENGINE);
        assert!(config.show_toc);
        assert_eq!(config.lookahead, DEFAULT_LOOKAHEAD);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = std::env::temp_dir().join(format!("mdpreview-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");

        let mut config = AppConfig::default();
        config.theme = config.theme.toggled();
        config.view_mode = ViewMode::Split;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.theme, Theme::Light);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let loaded = AppConfig::load_from(Path::new("/no/such/mdpreview.json")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_recent_files_dedup_and_cap() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_file(PathBuf::from(format!("/notes/{i}.md")));
        }
        config.add_recent_file(PathBuf::from("/notes/5.md"));

        assert_eq!(config.recent_files.len(), MAX_RECENT_FILES);
        assert_eq!(config.recent_files[0], PathBuf::from("/notes/5.md"));
        assert_eq!(
            config
                .recent_files
                .iter()
                .filter(|p| p.ends_with("5.md"))
                .count(),
            1
        );
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().toggled(), Theme::Light);
    }
}
