// ABOUTME: mpv executable discovery and process spawning with the fixed preview argument set
// ABOUTME: Output streams are discarded and mpv's own key bindings are disabled so global hotkeys stay in charge

use crate::config::PlayerConfig;
use crate::media::MediaPath;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

const PLAYER_BINARY: &str = "mpv";

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("mpv executable not found")]
    NotFound,
    #[error("Failed to launch mpv: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct PlayerLauncher {
    config: PlayerConfig,
}

impl PlayerLauncher {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    /// First existing executable among the configured path, the candidate
    /// list and (optionally) `PATH`.
    pub fn locate(&self) -> Option<PathBuf> {
        let explicit = self.config.path.iter().filter(|path| !path.trim().is_empty());

        for candidate in explicit.chain(self.config.candidates.iter()) {
            let path = PathBuf::from(candidate);
            if path.is_file() {
                debug!(path = %path.display(), "Found player executable");
                return Some(path);
            }
        }

        if self.config.search_path {
            if let Ok(path) = which::which(PLAYER_BINARY) {
                debug!(path = %path.display(), "Found player executable on PATH");
                return Some(path);
            }
        }

        None
    }

    pub fn arguments(&self, media: &MediaPath) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--hwdec=auto".to_string(),
            "--keep-open=yes".to_string(),
            "--osc=yes".to_string(),
            "--osd-level=1".to_string(),
            format!("--autofit={}", self.config.autofit),
            "--auto-window-resize=yes".to_string(),
            format!("--title={}", media.file_name()),
            "--force-window=immediate".to_string(),
            "--input-default-bindings=no".to_string(),
            "--input-vo-keyboard=no".to_string(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        args.extend(self.config.extra_args.iter().map(OsString::from));
        args.push(media.path().as_os_str().to_owned());
        args
    }

    pub fn spawn(&self, media: &MediaPath) -> Result<Child, PlayerError> {
        let executable = self.locate().ok_or(PlayerError::NotFound)?;
        let args = self.arguments(media);

        info!(player = %executable.display(), file = %media, "Launching player");
        debug!(?args, "Player arguments");

        let child = Command::new(&executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(child)
    }
}
