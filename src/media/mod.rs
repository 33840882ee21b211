// ABOUTME: Media file discovery module: playable-file classification, sibling listing and navigation
// ABOUTME: Provides the directory-level view used to step through videos next to the one being previewed

pub mod classifier;
pub mod natural;
pub mod navigation;
pub mod path;
pub mod siblings;

pub use classifier::Classifier;
pub use navigation::{Direction, Navigator};
pub use path::MediaPath;
pub use siblings::SiblingEnumerator;
