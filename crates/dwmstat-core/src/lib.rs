//! dwmstat-core — status line engine for the dwm window manager.
//!
//! Provides:
//! - `collector` — provider access: `/proc` and sysfs text, statvfs, HTTP
//! - `source` — one metric source per block kind, rendering fragments
//! - `buffer` — fixed-capacity fragment buffers
//! - `scheduler` — per-block intervals and minimal sleep computation
//! - `status` — composition and change detection
//! - `publish` — title sinks (`xsetroot`, stdout)
//! - `shutdown` — signal-driven cooperative shutdown
//! - `daemon` — the tick/compose/publish/sleep loop
//! - `manifest` — static block manifest and its validation
//! - `fmt` — shared formatting helpers

pub mod buffer;
pub mod collector;
pub mod daemon;
pub mod fmt;
pub mod manifest;
pub mod publish;
pub mod scheduler;
pub mod shutdown;
pub mod source;
pub mod status;

pub use daemon::Daemon;
pub use manifest::{BlockKind, Manifest, ManifestError};
pub use shutdown::Shutdown;
