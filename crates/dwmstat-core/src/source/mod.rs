//! Metric sources: one per block kind.
//!
//! Every source turns provider readings into one bracketed fragment and
//! writes it into the buffer it is handed. A source that fails returns an
//! error before writing anything, and keeps whatever private state it needs
//! between calls (the CPU source keeps its previous counter sample).

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::buffer::FragmentBuffer;
use crate::collector::{FetchError, FileSystem, HttpFetch, ParseError, SensorError, ThermalSensor};
use crate::manifest::{BlockKind, Manifest, ManifestError};

mod clock;
mod cpu;
mod mount;
mod ram;
mod thermal;
mod weather;

pub use clock::ClockSource;
pub use cpu::{CpuSource, usage_between};
pub use mount::MountSource;
pub use ram::RamSource;
pub use thermal::GpuSource;
pub use weather::{WeatherSource, extract_icon_temp, render_weather};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Unusable(&'static str),
}

/// What a source may look at during one refresh.
pub struct RefreshContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub http: &'a dyn HttpFetch,
    pub proc_path: &'a Path,
    pub sys_path: &'a Path,
    /// Local wall-clock time of the tick.
    pub now: DateTime<FixedOffset>,
}

impl RefreshContext<'_> {
    /// Reads a provider file, attaching the path to the error.
    pub(crate) fn read(&self, path: &Path) -> Result<String, SourceError> {
        self.fs.read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A metric source of one of the six kinds.
#[derive(Debug)]
pub enum Source {
    Cpu(CpuSource),
    Gpu(GpuSource),
    Ram(RamSource),
    Mount(MountSource),
    Clock(ClockSource),
    Weather(WeatherSource),
}

impl Source {
    /// Builds the source for `kind` from the manifest's settings.
    pub fn from_manifest(kind: BlockKind, manifest: &Manifest) -> Result<Self, ManifestError> {
        let marker = manifest.alert_marker.clone();
        let limits = &manifest.thresholds;
        let source = match kind {
            BlockKind::Cpu => Source::Cpu(CpuSource::new(
                ThermalSensor::new(manifest.cpu_thermal.clone(), manifest.thermal_divisor),
                limits.cpu_usage,
                limits.cpu_temp,
                marker,
            )),
            BlockKind::Gpu => Source::Gpu(GpuSource::new(
                ThermalSensor::new(manifest.gpu_thermal.clone(), manifest.thermal_divisor),
                limits.gpu_temp,
                marker,
            )),
            BlockKind::Ram => Source::Ram(RamSource::new(limits.ram_usage, marker)),
            BlockKind::Mount => Source::Mount(MountSource::new(
                manifest.mounts.clone(),
                limits.disk_usage,
                marker,
            )),
            BlockKind::Clock => Source::Clock(ClockSource::new(
                manifest.clock_format.clone(),
                manifest.chrono_locale()?,
            )),
            BlockKind::Weather => Source::Weather(WeatherSource::new(manifest.weather.clone())),
        };
        Ok(source)
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Source::Cpu(_) => BlockKind::Cpu,
            Source::Gpu(_) => BlockKind::Gpu,
            Source::Ram(_) => BlockKind::Ram,
            Source::Mount(_) => BlockKind::Mount,
            Source::Clock(_) => BlockKind::Clock,
            Source::Weather(_) => BlockKind::Weather,
        }
    }

    /// Renders this source's fragment into `buf`.
    ///
    /// On error nothing has been written.
    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        match self {
            Source::Cpu(s) => s.refresh(ctx, buf),
            Source::Gpu(s) => s.refresh(ctx, buf),
            Source::Ram(s) => s.refresh(ctx, buf),
            Source::Mount(s) => s.refresh(ctx, buf),
            Source::Clock(s) => s.refresh(ctx, buf),
            Source::Weather(s) => s.refresh(ctx, buf),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::collector::{MockFs, Offline};
    use chrono::TimeZone;

    /// Tuesday 2024-03-05 14:07:00 +01:00.
    pub(crate) fn fixed_now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 0)
            .unwrap()
    }

    pub(crate) fn context<'a>(fs: &'a MockFs, http: &'a dyn HttpFetch) -> RefreshContext<'a> {
        RefreshContext {
            fs,
            http,
            proc_path: Path::new("/proc"),
            sys_path: Path::new("/sys"),
            now: fixed_now(),
        }
    }

    pub(crate) fn offline_context(fs: &MockFs) -> RefreshContext<'_> {
        context(fs, &Offline)
    }

    /// Refreshes into a fresh 64-byte buffer and returns the fragment.
    pub(crate) fn render(
        source: &mut Source,
        ctx: &RefreshContext<'_>,
    ) -> Result<String, SourceError> {
        let mut buf = FragmentBuffer::with_capacity(64);
        source.refresh(ctx, &mut buf)?;
        Ok(buf.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn every_kind_builds_from_the_default_manifest() {
        let manifest = Manifest::default();
        for kind in BlockKind::ALL {
            let source = Source::from_manifest(kind, &manifest).unwrap();
            assert_eq!(source.kind(), kind);
        }
    }

    #[test]
    fn typical_desktop_fragments() {
        let fs = MockFs::typical_desktop();
        let ctx = offline_context(&fs);
        let manifest = Manifest::default();

        let mut gpu = Source::from_manifest(BlockKind::Gpu, &manifest).unwrap();
        assert_eq!(render(&mut gpu, &ctx).unwrap(), "[GPU 52.0ºC]");

        let mut ram = Source::from_manifest(BlockKind::Ram, &manifest).unwrap();
        assert_eq!(render(&mut ram, &ctx).unwrap(), "[RAM 34.4%]");

        let mut mount = Source::from_manifest(BlockKind::Mount, &manifest).unwrap();
        assert_eq!(render(&mut mount, &ctx).unwrap(), "[root 40.0%]");

        let mut clock = Source::from_manifest(BlockKind::Clock, &manifest).unwrap();
        assert_eq!(render(&mut clock, &ctx).unwrap(), "[Tuesday March 05 14:07]");
    }

    #[test]
    fn io_errors_name_the_provider() {
        let fs = MockFs::new();
        let ctx = offline_context(&fs);
        let err = ctx.read(Path::new("/proc/meminfo")).unwrap_err();
        assert!(err.to_string().starts_with("cannot read /proc/meminfo"));
    }
}
