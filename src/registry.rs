//! Registry of remote paths confirmed written during a write phase.
//!
//! Write workers publish into a `WrittenPathRegistry` concurrently. Once the
//! write pool has joined, the registry is frozen into `PublishedPaths`, an
//! immutable view the read workers share without any locking.

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// Append-only collection filled by concurrent write workers.
///
/// Entries are never removed or overwritten. Uniqueness comes from how
/// workers name their remote paths, so `publish` does not check for
/// duplicates.
#[derive(Debug, Default)]
pub struct WrittenPathRegistry {
    paths: Mutex<Vec<String>>,
}

impl WrittenPathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a remote path whose create operation succeeded
    pub fn publish(&self, remote_path: String) {
        self.paths.lock().push(remote_path);
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the paths published so far
    pub fn snapshot(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    /// Seal the registry. Taking `self` by value means no writer can still
    /// hold it.
    pub fn freeze(self) -> PublishedPaths {
        PublishedPaths {
            paths: self.paths.into_inner().into(),
        }
    }
}

/// Immutable, cheaply clonable view of the written paths
#[derive(Debug, Clone, Default)]
pub struct PublishedPaths {
    paths: Arc<[String]>,
}

impl PublishedPaths {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, remote_path: &str) -> bool {
        self.paths.iter().any(|p| p == remote_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Pick one path uniformly at random; `None` when nothing was written
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.paths.choose(rng).map(String::as_str)
    }
}

impl From<Vec<String>> for PublishedPaths {
    fn from(paths: Vec<String>) -> Self {
        Self {
            paths: paths.into(),
        }
    }
}
