//! Provider access for metric sources.
//!
//! Everything a block reads from outside the process goes through one of two
//! seams: the `FileSystem` trait (procfs, sysfs, statvfs) and the `HttpFetch`
//! trait (weather). Both have real and test implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Sources                            │
//! │  cpu / gpu / ram / mount            weather               │
//! │        │                               │                  │
//! │  ┌─────▼──────┐  ┌──────────────┐  ┌───▼─────────┐        │
//! │  │  procfs    │  │ ThermalSensor│  │  HttpFetch  │ (trait)│
//! │  │  parsers   │  │  (sysfs)     │  └───┬─────────┘        │
//! │  └─────┬──────┘  └──────┬───────┘      │                  │
//! │        └───────┬────────┘              │                  │
//! │         ┌──────▼──────┐                │                  │
//! │         │  FileSystem │ (trait)        │                  │
//! │         └──────┬──────┘                │                  │
//! └────────────────┼───────────────────────┼──────────────────┘
//!           ┌──────┴──────┐         ┌──────┴───────┐
//!           │ RealFs      │         │ ReqwestFetch │
//!           │ MockFs      │         │ Offline      │
//!           └─────────────┘         └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::path::Path;
//! use dwmstat_core::collector::{MockFs, ThermalSensor, ThermalSource, MILLIDEGREES};
//!
//! let fs = MockFs::typical_desktop();
//! let mut sensor = ThermalSensor::new(ThermalSource::hwmon("k10temp"), MILLIDEGREES);
//! let celsius = sensor.read(&fs, Path::new("/sys")).unwrap();
//! assert!(celsius > 0.0);
//! ```

pub mod http;
pub mod mock;
pub mod procfs;
pub mod sysfs;
pub mod traits;

pub use http::{FetchError, HttpFetch, Offline, ReqwestFetch};
pub use mock::MockFs;
pub use procfs::ParseError;
pub use sysfs::{MILLIDEGREES, SensorError, ThermalSensor, ThermalSource};
pub use traits::{FileSystem, FsStats, RealFs};
