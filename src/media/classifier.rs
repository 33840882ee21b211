// ABOUTME: Extension allow-list check deciding whether a path is a playable video candidate
// ABOUTME: Pure and case-insensitive; never touches the filesystem

use crate::media::path::MediaPath;
use std::path::Path;

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "mkv", "avi", "webm", "mp4", "m4v", "mov", "wmv", "flv", "ts", "mts", "m2ts",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    extensions: Vec<String>,
}

impl Classifier {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn is_playable(&self, path: &Path) -> bool {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        self.allows(extension.as_deref())
    }

    pub fn accepts(&self, media: &MediaPath) -> bool {
        self.allows(media.extension().as_deref())
    }

    fn allows(&self, extension: Option<&str>) -> bool {
        extension.is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions_are_playable() {
        let classifier = Classifier::default();

        assert!(classifier.is_playable(Path::new("movie.MKV")));
        assert!(classifier.is_playable(Path::new("/tmp/clip.mp4")));
        assert!(classifier.is_playable(Path::new("/tmp/broadcast.m2ts")));
        assert!(classifier.is_playable(Path::new("/tmp/Camera.MoV")));
    }

    #[test]
    fn test_other_files_are_not_playable() {
        let classifier = Classifier::default();

        assert!(!classifier.is_playable(Path::new("movie.txt")));
        assert!(!classifier.is_playable(Path::new("song.mp3")));
        assert!(!classifier.is_playable(Path::new("README")));
        assert!(!classifier.is_playable(Path::new(".mkv")));
        assert!(!classifier.is_playable(Path::new("archive.mkv.zip")));
    }

    #[test]
    fn test_media_paths_use_the_same_rules() {
        let classifier = Classifier::new(["mkv"]);

        assert!(classifier.accepts(&MediaPath::new("/videos/ep1.MKV")));
        assert!(!classifier.accepts(&MediaPath::new("/videos/ep1.mp4")));
        assert!(!classifier.accepts(&MediaPath::new("/videos/README")));
    }

    #[test]
    fn test_default_classifier_matches_builtin_list() {
        let classifier = Classifier::default();
        for ext in DEFAULT_EXTENSIONS {
            let name = format!("video.{}", ext.to_uppercase());
            assert!(classifier.is_playable(Path::new(&name)), "{name}");
        }
        assert!(!classifier.is_playable(Path::new("movie.txt")));
    }

    #[test]
    fn test_custom_extensions_are_normalized() {
        let classifier = Classifier::new([".MKV", " webm ", ""]);

        assert_eq!(classifier.extensions(), ["mkv", "webm"]);
        assert!(classifier.is_playable(Path::new("a.mkv")));
        assert!(classifier.is_playable(Path::new("b.WEBM")));
        assert!(!classifier.is_playable(Path::new("c.mp4")));
    }
}
