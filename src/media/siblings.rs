// ABOUTME: Lists the playable videos that share a directory with a given file
// ABOUTME: Re-reads the directory on every call and orders results naturally by file name

use crate::media::classifier::Classifier;
use crate::media::natural::compare_file_names;
use crate::media::path::MediaPath;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SiblingEnumerator {
    classifier: Classifier,
}

impl SiblingEnumerator {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// Playable files in `media`'s directory, including `media` itself if it
    /// still exists. An unreadable directory yields an empty list.
    pub fn siblings(&self, media: &MediaPath) -> Vec<MediaPath> {
        let directory = media.parent();

        match self.read_directory(directory) {
            Ok(files) => files,
            Err(e) => {
                warn!(
                    directory = %directory.display(),
                    error = %e,
                    "Failed to read directory, treating it as empty"
                );
                Vec::new()
            }
        }
    }

    fn read_directory(&self, directory: &Path) -> io::Result<Vec<MediaPath>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(directory)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };

            let name = entry.file_name();
            if is_hidden(&name) {
                continue;
            }

            let media = MediaPath::new(entry.path());
            if !self.classifier.accepts(&media) || !media.path().is_file() {
                continue;
            }

            files.push((name.to_string_lossy().into_owned(), media));
        }

        files.sort_by(|(a, _), (b, _)| compare_file_names(a, b));
        Ok(files.into_iter().map(|(_, media)| media).collect())
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
