//! Ordered file list with a current position.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::error::{Result, ViewerError};

/// Seeded ordering used to shuffle paths.
///
/// Each path gets a rank from an xxh3 hash of its bytes; sorting by rank
/// gives a permutation that only depends on the seed. Every lap derives a
/// new seed so successive laps differ.
#[derive(Debug, Clone)]
pub struct Shuffle {
    seed: u64,
    laps: u64,
}

impl Shuffle {
    pub fn new(seed: u64) -> Self {
        Self { seed, laps: 0 }
    }

    pub fn from_clock() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9e3779b97f4a7c15);
        Self::new(seed)
    }

    fn rank(seed: u64, path: &Path) -> u64 {
        xxh3_64_with_seed(path.as_os_str().as_encoded_bytes(), seed)
    }

    /// Permutes `paths` in place and advances to the next lap seed.
    pub fn apply(&mut self, paths: &mut [PathBuf]) {
        let seed = xxh3_64_with_seed(&self.laps.to_le_bytes(), self.seed);
        self.laps += 1;
        paths.sort_by(|a, b| {
            Self::rank(seed, a)
                .cmp(&Self::rank(seed, b))
                .then_with(|| a.cmp(b))
        });
    }
}

/// The navigation sequence of the viewer.
///
/// All index arithmetic lives here: callers only use `move_by`, `jump_to`
/// and `remove`.
#[derive(Debug, Default)]
pub struct PathStore {
    paths: Vec<PathBuf>,
    index: usize,
    shuffle: Option<Shuffle>,
}

impl PathStore {
    pub fn new(paths: Vec<PathBuf>, index: usize) -> Self {
        let mut store = Self::default();
        store.replace(paths, index);
        store
    }

    /// Swaps in a new list, clamping `index` into range.
    pub fn replace(&mut self, paths: Vec<PathBuf>, index: usize) {
        self.index = index.min(paths.len().saturating_sub(1));
        self.paths = paths;
    }

    /// Enables reshuffle on lap. Does not touch the current order.
    pub fn set_shuffle(&mut self, shuffle: Option<Shuffle>) {
        self.shuffle = shuffle;
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Current index, `None` for an empty list.
    pub fn index(&self) -> Option<usize> {
        (!self.paths.is_empty()).then_some(self.index)
    }

    pub fn current(&self) -> Option<&Path> {
        self.paths.get(self.index).map(PathBuf::as_path)
    }

    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.paths.iter().position(|p| p == path)
    }

    /// Selects an entry by zero-based index without any wrap logic.
    pub fn select(&mut self, index: usize) -> Result<usize> {
        if index >= self.paths.len() {
            return Err(ViewerError::OutOfRange {
                position: index + 1,
                len: self.paths.len(),
            });
        }
        self.index = index;
        Ok(index)
    }

    /// Moves by `delta` entries and returns the new index.
    ///
    /// With `wrap` the index is taken modulo the list length and a forward
    /// move landing exactly on 0 reshuffles everything after position 0 when
    /// shuffle is active. Without `wrap` the index stops at either end.
    pub fn move_by(&mut self, delta: isize, wrap: bool) -> Result<usize> {
        if self.paths.is_empty() {
            return Err(ViewerError::EmptyList);
        }
        let len = self.paths.len();
        // Reduce first: a long numeric prefix can push `delta` near isize::MAX.
        self.index = if wrap {
            let step = delta.rem_euclid(len as isize) as usize;
            (self.index + step) % len
        } else {
            (self.index as isize)
                .saturating_add(delta)
                .clamp(0, len as isize - 1) as usize
        };

        if wrap && delta > 0 && self.index == 0 {
            if let Some(shuffle) = self.shuffle.as_mut() {
                debug!("Lap completed, reshuffling {} paths", self.paths.len() - 1);
                shuffle.apply(&mut self.paths[1..]);
            }
        }
        Ok(self.index)
    }

    /// Jumps to a 1-based position. Out-of-range positions are rejected and
    /// leave the index untouched.
    pub fn jump_to(&mut self, position: usize) -> Result<usize> {
        let len = self.paths.len();
        if len == 0 {
            return Err(ViewerError::EmptyList);
        }
        if position < 1 || position > len {
            return Err(ViewerError::OutOfRange { position, len });
        }
        self.index = position - 1;
        Ok(self.index)
    }

    /// Removes the first occurrence of `path`, returning its former index.
    ///
    /// The current index keeps pointing at the same entry when an earlier
    /// one is removed; removing the current entry leaves the index on its
    /// successor (clamped to the end). No navigation happens here.
    pub fn remove(&mut self, path: &Path) -> Option<usize> {
        let removed = self.position_of(path)?;
        self.paths.remove(removed);
        if removed < self.index {
            self.index -= 1;
        }
        self.index = self.index.min(self.paths.len().saturating_sub(1));
        Some(removed)
    }
}
