// ABOUTME: Finder selection query via AppleScript and frontmost-application check via NSWorkspace
// ABOUTME: Failures are logged and read as "nothing selected"

use crate::platform::{SelectionSource, parse_path_lines};
use objc2_app_kit::NSWorkspace;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

const SELECTION_SCRIPT: &str = r#"tell application "Finder"
    set selectedItems to selection
    set filePaths to ""
    repeat with anItem in selectedItems
        try
            set filePaths to filePaths & (POSIX path of (anItem as alias)) & linefeed
        end try
    end repeat
    return filePaths
end tell"#;

pub struct FinderSelection {
    host_bundle_id: String,
}

impl FinderSelection {
    pub fn new(host_bundle_id: String) -> Self {
        Self { host_bundle_id }
    }
}

impl SelectionSource for FinderSelection {
    fn current_selection(&self) -> Vec<PathBuf> {
        match Command::new("osascript").args(["-e", SELECTION_SCRIPT]).output() {
            Ok(output) if output.status.success() => {
                let paths = parse_path_lines(&String::from_utf8_lossy(&output.stdout));
                debug!(count = paths.len(), "Queried Finder selection");
                paths
            }
            Ok(output) => {
                warn!(
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Finder selection script failed"
                );
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to run osascript");
                Vec::new()
            }
        }
    }

    fn is_host_frontmost(&self) -> bool {
        let frontmost = unsafe {
            NSWorkspace::sharedWorkspace()
                .frontmostApplication()
                .and_then(|app| app.bundleIdentifier())
                .map(|id| id.to_string())
        };

        debug!(frontmost = ?frontmost, "Frontmost application");
        frontmost.as_deref() == Some(self.host_bundle_id.as_str())
    }
}
