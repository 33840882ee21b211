// ABOUTME: Next/previous lookup relative to the current video with wraparound at both ends
// ABOUTME: Asks the sibling enumerator afresh on each call so directory changes are picked up

use crate::media::path::MediaPath;
use crate::media::siblings::SiblingEnumerator;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

#[derive(Debug, Clone, Default)]
pub struct Navigator {
    enumerator: SiblingEnumerator,
}

impl Navigator {
    pub fn new(enumerator: SiblingEnumerator) -> Self {
        Self { enumerator }
    }

    pub fn next(&self, current: &MediaPath) -> Option<MediaPath> {
        self.step(current, Direction::Next)
    }

    pub fn previous(&self, current: &MediaPath) -> Option<MediaPath> {
        self.step(current, Direction::Previous)
    }

    /// Returns `None` when `current` is no longer among its siblings
    /// (deleted or renamed) or when there are no siblings at all.
    pub fn step(&self, current: &MediaPath, direction: Direction) -> Option<MediaPath> {
        let mut siblings = self.enumerator.siblings(current);

        let Some(index) = siblings
            .iter()
            .position(|candidate| candidate.path().file_name() == current.path().file_name())
        else {
            debug!(
                file = %current,
                candidates = siblings.len(),
                "Current file not found among siblings"
            );
            return None;
        };

        let target = step_index(index, siblings.len(), direction);
        Some(siblings.swap_remove(target))
    }
}

/// Index reached from `index` in a list of `len` items, wrapping at both ends.
pub fn step_index(index: usize, len: usize, direction: Direction) -> usize {
    debug_assert!(index < len);
    match direction {
        Direction::Next => (index + 1) % len,
        Direction::Previous => (index + len - 1) % len,
    }
}
