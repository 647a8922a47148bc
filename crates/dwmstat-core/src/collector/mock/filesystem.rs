//! In-memory mock filesystem for testing sources without real `/proc` or `/sys`.
//!
//! This module provides `MockFs` which simulates provider files and mounted
//! filesystems in memory, so tests run anywhere.

use crate::collector::traits::{FileSystem, FsStats};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// In-memory filesystem for testing.
///
/// Clones share the same storage, so a test can keep a handle and rewrite a
/// file between two refreshes of a source that owns another clone.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Canned statvfs results keyed by mount path.
    mounts: HashMap<PathBuf, FsStats>,
}

impl Inner {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or overwrites) a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut inner = self.write();
        inner.add_parents(&path);
        inner.files.insert(path, content.into());
    }

    /// Removes a file, simulating a provider that went away.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.write().files.remove(path.as_ref());
    }

    /// Adds an empty directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut inner = self.write();
        inner.add_parents(&path);
        inner.directories.insert(path);
    }

    /// Registers a mounted filesystem with the given block counts.
    pub fn add_mount(&self, path: impl AsRef<Path>, blocks: u64, blocks_free: u64) {
        self.write().mounts.insert(
            path.as_ref().to_path_buf(),
            FsStats {
                blocks,
                blocks_free,
            },
        );
    }

    /// Adds an hwmon device directory with a `name` file and temperature inputs.
    ///
    /// # Arguments
    /// * `sys_path` - Base sysfs path (usually "/sys")
    /// * `index` - The N in `hwmonN`
    /// * `driver` - Content of the `name` file
    /// * `inputs` - `(file name, millidegrees)` pairs
    pub fn add_hwmon(&self, sys_path: &str, index: u32, driver: &str, inputs: &[(&str, i64)]) {
        let base = PathBuf::from(format!("{}/class/hwmon/hwmon{}", sys_path, index));
        self.add_dir(&base);
        self.add_file(base.join("name"), format!("{}\n", driver));
        for (name, millideg) in inputs {
            self.add_file(base.join(name), format!("{}\n", millideg));
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.read().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let inner = self.read();
        inner.files.contains_key(path) || inner.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let inner = self.read();
        if !inner.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in inner.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &inner.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn fs_stats(&self, path: &Path) -> io::Result<FsStats> {
        self.read().mounts.get(path).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no filesystem mounted at {:?}", path),
            )
        })
    }
}
