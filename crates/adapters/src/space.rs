// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Free-space probing for admission throttling.

use std::io;
use std::path::Path;

/// Reports free bytes on the filesystem holding a directory.
pub trait SpaceProbe: Clone + Send + Sync + 'static {
    fn free_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// Real probe over statvfs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSpaceProbe;

impl DiskSpaceProbe {
    pub fn new() -> Self {
        Self
    }
}

impl SpaceProbe for DiskSpaceProbe {
    fn free_bytes(&self, path: &Path) -> io::Result<u64> {
        fs2::available_space(path)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSpaceProbe;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    //! Fake space probe for testing
    #![cfg_attr(coverage_nightly, coverage(off))]

    use super::SpaceProbe;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    #[derive(Clone, Copy)]
    enum Entry {
        /// Fixed free-byte reading
        Fixed(u64),
        /// Capacity minus the live size of the directory's contents,
        /// so copies into the tree shrink the reading like a real disk
        Capacity(u64),
    }

    /// Scriptable probe. Clones share state.
    #[derive(Clone, Default)]
    pub struct FakeSpaceProbe {
        entries: Arc<Mutex<HashMap<PathBuf, Entry>>>,
    }

    impl FakeSpaceProbe {
        pub fn new() -> Self {
            Self::default()
        }

        /// Report a constant free-space value for a directory tree.
        pub fn set_free(&self, path: impl Into<PathBuf>, bytes: u64) {
            self.entries.lock().insert(path.into(), Entry::Fixed(bytes));
        }

        /// Report `capacity - current contents` for a directory tree.
        pub fn set_capacity(&self, path: impl Into<PathBuf>, bytes: u64) {
            self.entries
                .lock()
                .insert(path.into(), Entry::Capacity(bytes));
        }
    }

    fn dir_size(path: &Path) -> u64 {
        let Ok(entries) = std::fs::read_dir(path) else {
            return 0;
        };
        let mut total = 0;
        for entry in entries.flatten() {
            let p = entry.path();
            if p.is_dir() {
                total += dir_size(&p);
            } else if let Ok(meta) = p.metadata() {
                total += meta.len();
            }
        }
        total
    }

    impl SpaceProbe for FakeSpaceProbe {
        fn free_bytes(&self, path: &Path) -> io::Result<u64> {
            let entries = self.entries.lock();
            // Match the directory itself or its closest configured ancestor
            for candidate in path.ancestors() {
                if let Some(entry) = entries.get(candidate) {
                    return Ok(match *entry {
                        Entry::Fixed(bytes) => bytes,
                        Entry::Capacity(capacity) => {
                            capacity.saturating_sub(dir_size(candidate))
                        }
                    });
                }
            }
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no fake space entry covers {}", path.display()),
            ))
        }
    }
}

#[cfg(test)]
#[path = "space_tests.rs"]
mod tests;
