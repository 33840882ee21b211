// ABOUTME: Configuration structures and parsing for the player, media filter and preview behavior
// ABOUTME: Loaded from a TOML file in the user config directory, generated with commented defaults on first run

use crate::media::classifier::DEFAULT_EXTENSIONS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_STOP_GRACE_MS: u64 = 2_000;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub player: PlayerConfig,
    pub media: MediaConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlayerConfig {
    /// Explicit player executable, tried before `candidates`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub candidates: Vec<String>,
    #[serde(default = "default_search_path")]
    pub search_path: bool,
    #[serde(default = "default_autofit")]
    pub autofit: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MediaConfig {
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PreviewConfig {
    #[serde(default = "default_host_bundle_id")]
    pub host_bundle_id: String,
    #[serde(default = "default_close_suppression_ms")]
    pub close_suppression_ms: u64,
}

fn default_search_path() -> bool {
    true
}

fn default_autofit() -> String {
    "80%".to_string()
}

fn default_stop_grace_ms() -> u64 {
    100
}

fn default_host_bundle_id() -> String {
    "com.apple.finder".to_string()
}

fn default_close_suppression_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Config {
            player: PlayerConfig::default(),
            media: MediaConfig {
                extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            },
            preview: PreviewConfig {
                host_bundle_id: default_host_bundle_id(),
                close_suppression_ms: default_close_suppression_ms(),
            },
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            path: None,
            candidates: vec![
                "/opt/homebrew/bin/mpv".to_string(),
                "/usr/local/bin/mpv".to_string(),
                "/Applications/mpv.app/Contents/MacOS/mpv".to_string(),
            ],
            search_path: default_search_path(),
            autofit: default_autofit(),
            extra_args: Vec::new(),
            stop_grace_ms: default_stop_grace_ms(),
        }
    }
}

impl PlayerConfig {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

impl PreviewConfig {
    pub fn close_suppression(&self) -> Duration {
        Duration::from_millis(self.close_suppression_ms)
    }
}

impl Config {
    pub fn default_config_content() -> &'static str {
        r#"# QuickPlay Configuration

[player]
# mpv is looked up in this order: `path` (if set), each entry of
# `candidates`, then `mpv` on PATH when `search_path` is enabled.
# path = "~/bin/mpv"
candidates = [
    "/opt/homebrew/bin/mpv",
    "/usr/local/bin/mpv",
    "/Applications/mpv.app/Contents/MacOS/mpv",
]
search_path = true
# Initial window size relative to the screen
autofit = "80%"
# Extra mpv arguments, inserted before the file path
extra_args = []
# How long to wait for mpv to quit before killing it
stop_grace_ms = 100

[media]
# File extensions treated as playable videos (case-insensitive)
extensions = ["mkv", "avi", "webm", "mp4", "m4v", "mov", "wmv", "flv", "ts", "mts", "m2ts"]

[preview]
# Previews are only triggered while this application is frontmost
host_bundle_id = "com.apple.finder"
# Ignore preview requests for this long after closing a preview
close_suppression_ms = 500
"#
    }

    pub fn load_from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::load_from_str(&content)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
        Ok(config_dir.join("quickplay").join("config.toml"))
    }

    pub fn expand_path(&mut self) -> Result<()> {
        if let Some(path) = &self.player.path {
            self.player.path = Some(expand_tilde(path)?);
        }
        for candidate in &mut self.player.candidates {
            *candidate = expand_tilde(candidate)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.player.path.is_none()
            && self.player.candidates.is_empty()
            && !self.player.search_path
        {
            anyhow::bail!("No way to locate the player: set a path, candidates or search_path");
        }

        if self.player.autofit.trim().is_empty() {
            anyhow::bail!("autofit cannot be empty");
        }

        if self.player.stop_grace_ms == 0 || self.player.stop_grace_ms > MAX_STOP_GRACE_MS {
            anyhow::bail!("stop_grace_ms must be between 1 and {MAX_STOP_GRACE_MS}");
        }

        if self.media.extensions.iter().all(|ext| ext.trim().is_empty()) {
            anyhow::bail!("At least one media extension must be configured");
        }

        if self.preview.host_bundle_id.trim().is_empty() {
            anyhow::bail!("host_bundle_id cannot be empty");
        }

        Ok(())
    }

    pub fn save_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config to: {}", path.display()))?;

        Ok(())
    }
}

fn expand_tilde(path: &str) -> Result<String> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(rest).to_string_lossy().into_owned())
    } else {
        Ok(path.to_string())
    }
}
