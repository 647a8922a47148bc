//! Abstractions for provider access to enable testing and mocking.
//!
//! The `FileSystem` trait lets every metric source read `/proc`, sysfs and
//! filesystem statistics either from the real system or from an in-memory
//! mock in tests.

use std::io;
use std::path::{Path, PathBuf};

/// Block counts of a mounted filesystem, as reported by `statvfs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsStats {
    /// Total data blocks.
    pub blocks: u64,
    /// Free blocks, including those reserved for the superuser.
    pub blocks_free: u64,
}

impl FsStats {
    /// Used share of the filesystem in percent, `0.0` for a zero-sized one.
    pub fn used_percent(&self) -> f64 {
        crate::fmt::percent(self.blocks.saturating_sub(self.blocks_free), self.blocks)
    }
}

/// Abstraction for provider reads.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns block counts for the filesystem containing `path`.
    fn fs_stats(&self, path: &Path) -> io::Result<FsStats>;
}

/// Real filesystem implementation that delegates to `std::fs` and `statvfs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn fs_stats(&self, path: &Path) -> io::Result<FsStats> {
        statvfs(path)
    }
}

#[cfg(unix)]
fn statvfs(path: &Path) -> io::Result<FsStats> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();

    // SAFETY: `c_path` is a valid NUL-terminated string and `stat` points to
    // writable memory large enough for a `statvfs` struct.
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: statvfs returned 0, so the struct has been fully initialized.
    let stat = unsafe { stat.assume_init() };
    Ok(FsStats {
        blocks: stat.f_blocks as u64,
        blocks_free: stat.f_bfree as u64,
    })
}

#[cfg(not(unix))]
fn statvfs(_path: &Path) -> io::Result<FsStats> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "statvfs is only available on unix",
    ))
}
