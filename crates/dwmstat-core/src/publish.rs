//! Title sinks: where the composed status line ends up.
//!
//! dwm reads its status text from the root window name. [`XsetrootSink`]
//! sets it by running `xsetroot -name`, [`StdoutSink`] prints one line per
//! publish for other bars or for debugging.

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("cannot open title sink: {0}")]
    Connect(String),
    #[error("title sink I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("xsetroot exited with {0}")]
    Exit(String),
}

/// Destination for the published status text.
pub trait TitleSink {
    fn set_title(&mut self, title: &str) -> Result<(), PublishError>;
}

/// Sets the X root window name through the `xsetroot` utility.
#[derive(Debug, Clone)]
pub struct XsetrootSink {
    program: PathBuf,
    display: OsString,
}

impl XsetrootSink {
    /// Opens the display named by `$DISPLAY` with the `xsetroot` found on `$PATH`.
    pub fn connect() -> Result<Self, PublishError> {
        Self::connect_with(env::var_os("DISPLAY"), env::var_os("PATH"))
    }

    /// Locates `xsetroot` in `path` and clears the root window name once.
    ///
    /// The clearing run is what proves the display is reachable: `xsetroot`
    /// exits non-zero when it cannot open it.
    pub fn connect_with(
        display: Option<OsString>,
        path: Option<OsString>,
    ) -> Result<Self, PublishError> {
        let display = display
            .filter(|d| !d.is_empty())
            .ok_or_else(|| PublishError::Connect("DISPLAY is not set".to_string()))?;

        let path = path.unwrap_or_default();
        let program = find_program("xsetroot", env::split_paths(&path))
            .ok_or_else(|| PublishError::Connect("xsetroot not found on PATH".to_string()))?;

        let mut sink = Self { program, display };
        sink.set_title("").map_err(|e| {
            PublishError::Connect(format!(
                "cannot open display {}: {}",
                sink.display.to_string_lossy(),
                e
            ))
        })?;
        Ok(sink)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TitleSink for XsetrootSink {
    fn set_title(&mut self, title: &str) -> Result<(), PublishError> {
        let status = Command::new(&self.program)
            .env("DISPLAY", &self.display)
            .arg("-name")
            .arg(title)
            .status()?;
        if !status.success() {
            return Err(PublishError::Exit(status.to_string()));
        }
        Ok(())
    }
}

/// Finds the first regular file called `name` in `dirs`.
pub fn find_program(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Writes each title as a line to a writer, stdout by default.
pub struct StdoutSink<W: Write = io::Stdout> {
    out: W,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> StdoutSink<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TitleSink for StdoutSink<W> {
    fn set_title(&mut self, title: &str) -> Result<(), PublishError> {
        writeln!(self.out, "{}", title)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<S: TitleSink + ?Sized> TitleSink for Box<S> {
    fn set_title(&mut self, title: &str) -> Result<(), PublishError> {
        (**self).set_title(title)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn stdout_sink_writes_one_line_per_title() {
        let mut sink = StdoutSink::with_writer(Vec::new());
        sink.set_title("[CPU 10.0% 40.0ºC]").unwrap();
        sink.set_title("").unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "[CPU 10.0% 40.0ºC]\n\n");
    }

    #[test]
    fn find_program_searches_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(second.path().join("xsetroot"), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_program("xsetroot", dirs.clone()),
            Some(second.path().join("xsetroot"))
        );

        fs::write(first.path().join("xsetroot"), "").unwrap();
        assert_eq!(
            find_program("xsetroot", dirs),
            Some(first.path().join("xsetroot"))
        );
    }

    #[test]
    fn find_program_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("xsetroot")).unwrap();
        assert_eq!(find_program("xsetroot", vec![dir.path().to_path_buf()]), None);
    }

    /// Writes an executable `xsetroot` stand-in that exits with `code`.
    #[cfg(unix)]
    fn fake_xsetroot(dir: &Path, code: i32) {
        use std::os::unix::fs::PermissionsExt;

        let program = dir.join("xsetroot");
        fs::write(&program, format!("#!/bin/sh\nexit {}\n", code)).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn connect_requires_display() {
        let dir = TempDir::new().unwrap();
        let path = Some(dir.path().as_os_str().to_os_string());
        assert!(matches!(
            XsetrootSink::connect_with(None, path.clone()),
            Err(PublishError::Connect(_))
        ));
        assert!(matches!(
            XsetrootSink::connect_with(Some(OsString::new()), path),
            Err(PublishError::Connect(_))
        ));
    }

    #[test]
    fn connect_requires_xsetroot_on_path() {
        let dir = TempDir::new().unwrap();
        let result = XsetrootSink::connect_with(
            Some(OsString::from(":0")),
            Some(dir.path().as_os_str().to_os_string()),
        );
        assert!(matches!(result, Err(PublishError::Connect(msg)) if msg.contains("PATH")));
    }

    #[cfg(unix)]
    #[test]
    fn connect_fails_when_display_cannot_be_opened() {
        let dir = TempDir::new().unwrap();
        fake_xsetroot(dir.path(), 1);
        let result = XsetrootSink::connect_with(
            Some(OsString::from(":99")),
            Some(dir.path().as_os_str().to_os_string()),
        );
        assert!(matches!(result, Err(PublishError::Connect(msg)) if msg.contains(":99")));
    }

    #[cfg(unix)]
    #[test]
    fn connect_succeeds_when_xsetroot_runs() {
        let dir = TempDir::new().unwrap();
        fake_xsetroot(dir.path(), 0);
        let mut sink = XsetrootSink::connect_with(
            Some(OsString::from(":0")),
            Some(dir.path().as_os_str().to_os_string()),
        )
        .unwrap();
        assert_eq!(sink.program(), dir.path().join("xsetroot"));
        sink.set_title("[RAM 34.4%]").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn xsetroot_failure_maps_to_exit_error() {
        let dir = TempDir::new().unwrap();
        fake_xsetroot(dir.path(), 1);
        let mut sink = XsetrootSink {
            program: dir.path().join("xsetroot"),
            display: OsString::from(":0"),
        };
        assert!(matches!(sink.set_title("x"), Err(PublishError::Exit(_))));
    }

    #[test]
    fn boxed_sinks_forward() {
        let recording = testing::RecordingSink::new();
        let mut sink: Box<dyn TitleSink> = Box::new(recording.clone());
        sink.set_title("a").unwrap();
        assert_eq!(recording.titles(), vec!["a".to_string()]);
    }
}
