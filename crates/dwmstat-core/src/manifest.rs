//! The static manifest: which blocks run, how often, and with what settings.
//!
//! A manifest is assembled once at startup (built-in defaults plus command
//! line overrides), validated, and never changed afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Serialize;
use thiserror::Error;

use crate::buffer::DEFAULT_CAPACITY;
use crate::collector::sysfs::{MILLIDEGREES, ThermalSource};

/// Shortest interval a block may run at.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("unknown block {0:?} (expected one of cpu, gpu, ram, mount, clock, weather)")]
    UnknownBlock(String),
    #[error("block {0} is listed more than once")]
    DuplicateBlock(BlockKind),
    #[error("block {kind} interval {secs}s is below the 1s minimum")]
    IntervalTooShort { kind: BlockKind, secs: u64 },
    #[error("invalid interval {0:?} (expected KIND=SECONDS)")]
    InvalidInterval(String),
    #[error("invalid mount {0:?} (expected PATH:LABEL)")]
    InvalidMount(String),
    #[error("unknown weather format {0:?} (expected raw or icon-temp)")]
    InvalidWeatherFormat(String),
    #[error("unknown locale {0:?}")]
    UnknownLocale(String),
    #[error("invalid clock format {0:?}")]
    InvalidClockFormat(String),
    #[error("fragment capacity must be at least 1 byte")]
    ZeroCapacity,
    #[error("weather block enabled without a URL")]
    MissingWeatherUrl,
    #[error("weather timeout must be at least 1 second")]
    ZeroWeatherTimeout,
    #[error("weather text limit must be at least 1 byte")]
    ZeroWeatherMaxLen,
}

/// The closed set of metric kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Cpu,
    Gpu,
    Ram,
    Mount,
    Clock,
    Weather,
}

impl BlockKind {
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Cpu,
        BlockKind::Gpu,
        BlockKind::Ram,
        BlockKind::Mount,
        BlockKind::Clock,
        BlockKind::Weather,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::Cpu => "cpu",
            BlockKind::Gpu => "gpu",
            BlockKind::Ram => "ram",
            BlockKind::Mount => "mount",
            BlockKind::Clock => "clock",
            BlockKind::Weather => "weather",
        }
    }

    /// Refresh cadence used when the manifest does not override it.
    pub fn default_interval(self) -> Duration {
        match self {
            BlockKind::Cpu | BlockKind::Clock => Duration::from_secs(1),
            BlockKind::Gpu | BlockKind::Ram => Duration::from_secs(2),
            BlockKind::Mount => Duration::from_secs(60),
            BlockKind::Weather => Duration::from_secs(30 * 60),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockKind {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ManifestError::UnknownBlock(s.to_string()))
    }
}

/// One enabled block and its cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSpec {
    pub kind: BlockKind,
    pub interval: Duration,
}

impl BlockSpec {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            interval: kind.default_interval(),
        }
    }
}

/// Parses `KIND=SECONDS`, e.g. `weather=3600`.
pub fn parse_interval(s: &str) -> Result<(BlockKind, Duration), ManifestError> {
    let (kind, secs) = s
        .split_once('=')
        .ok_or_else(|| ManifestError::InvalidInterval(s.to_string()))?;
    let kind: BlockKind = kind.parse()?;
    let secs: u64 = secs
        .trim()
        .parse()
        .map_err(|_| ManifestError::InvalidInterval(s.to_string()))?;
    Ok((kind, Duration::from_secs(secs)))
}

/// Alert limits. A value at or above its limit gets the alert marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    /// CPU usage, percent.
    pub cpu_usage: f64,
    /// CPU temperature, degrees Celsius.
    pub cpu_temp: f64,
    /// GPU temperature, degrees Celsius.
    pub gpu_temp: f64,
    /// RAM usage, percent.
    pub ram_usage: f64,
    /// Usage of any watched filesystem, percent.
    pub disk_usage: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_usage: 90.0,
            cpu_temp: 80.0,
            gpu_temp: 85.0,
            ram_usage: 90.0,
            disk_usage: 95.0,
        }
    }
}

/// A filesystem to watch and the label it is shown under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountPoint {
    pub path: PathBuf,
    pub label: String,
}

impl MountPoint {
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }
}

impl FromStr for MountPoint {
    type Err = ManifestError;

    /// Parses `PATH:LABEL`. The label is taken after the last colon.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, label) = s
            .rsplit_once(':')
            .ok_or_else(|| ManifestError::InvalidMount(s.to_string()))?;
        if path.is_empty() || label.trim().is_empty() {
            return Err(ManifestError::InvalidMount(s.to_string()));
        }
        Ok(Self::new(path, label.trim()))
    }
}

/// How the weather response body becomes a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherFormat {
    /// Use the body as-is, flattened to one line and cut to `max_len` bytes.
    #[default]
    Raw,
    /// Pull the icon and temperature out of a `Place: icon +12°C` line.
    IconTemp,
}

impl FromStr for WeatherFormat {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(WeatherFormat::Raw),
            "icon-temp" | "icon_temp" => Ok(WeatherFormat::IconTemp),
            _ => Err(ManifestError::InvalidWeatherFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherConfig {
    pub url: String,
    pub timeout: Duration,
    pub format: WeatherFormat,
    /// Byte limit for the text inside the brackets.
    pub max_len: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            // %c is the condition icon, %t the temperature
            url: "https://wttr.in/?format=%c%t".to_string(),
            timeout: Duration::from_secs(5),
            format: WeatherFormat::Raw,
            max_len: 32,
        }
    }
}

/// Everything the daemon needs to know, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Enabled blocks, in display order.
    pub blocks: Vec<BlockSpec>,
    /// Per-fragment byte capacity.
    pub capacity: usize,
    pub alert_marker: String,
    pub thresholds: Thresholds,
    pub cpu_thermal: ThermalSource,
    pub gpu_thermal: ThermalSource,
    /// Divides raw sensor readings into degrees Celsius.
    pub thermal_divisor: f64,
    pub mounts: Vec<MountPoint>,
    /// strftime pattern of the clock block, brackets included.
    pub clock_format: String,
    pub locale: String,
    pub weather: WeatherConfig,
    pub proc_path: PathBuf,
    pub sys_path: PathBuf,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            blocks: [BlockKind::Cpu, BlockKind::Gpu, BlockKind::Ram, BlockKind::Clock]
                .into_iter()
                .map(BlockSpec::new)
                .collect(),
            capacity: DEFAULT_CAPACITY,
            alert_marker: "!".to_string(),
            thresholds: Thresholds::default(),
            cpu_thermal: ThermalSource::hwmon("k10temp"),
            gpu_thermal: ThermalSource::hwmon("amdgpu"),
            thermal_divisor: MILLIDEGREES,
            mounts: vec![MountPoint::new("/", "root")],
            clock_format: "[%A %B %d %H:%M]".to_string(),
            locale: "en_US".to_string(),
            weather: WeatherConfig::default(),
            proc_path: PathBuf::from("/proc"),
            sys_path: PathBuf::from("/sys"),
        }
    }
}

impl Manifest {
    /// Replaces the block list, keeping each kind's default interval.
    pub fn with_blocks(mut self, kinds: &[BlockKind]) -> Self {
        self.blocks = kinds.iter().copied().map(BlockSpec::new).collect();
        self
    }

    /// Overrides the interval of `kind` if it is enabled.
    pub fn set_interval(&mut self, kind: BlockKind, interval: Duration) {
        for block in self.blocks.iter_mut().filter(|b| b.kind == kind) {
            block.interval = interval;
        }
    }

    pub fn is_enabled(&self, kind: BlockKind) -> bool {
        self.blocks.iter().any(|b| b.kind == kind)
    }

    /// Resolves the configured locale name (`en_US`, `de_DE.UTF-8`, ...).
    pub fn chrono_locale(&self) -> Result<chrono::Locale, ManifestError> {
        let name = self.locale.split('.').next().unwrap_or_default();
        chrono::Locale::try_from(name).map_err(|_| ManifestError::UnknownLocale(self.locale.clone()))
    }

    /// Checks every invariant the daemon relies on.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.capacity == 0 {
            return Err(ManifestError::ZeroCapacity);
        }

        let mut seen = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            if seen.contains(&block.kind) {
                return Err(ManifestError::DuplicateBlock(block.kind));
            }
            seen.push(block.kind);

            if block.interval < MIN_INTERVAL {
                return Err(ManifestError::IntervalTooShort {
                    kind: block.kind,
                    secs: block.interval.as_secs(),
                });
            }
        }

        if StrftimeItems::new(&self.clock_format).any(|item| matches!(item, Item::Error)) {
            return Err(ManifestError::InvalidClockFormat(self.clock_format.clone()));
        }
        self.chrono_locale()?;

        if self.is_enabled(BlockKind::Weather) && self.weather.url.trim().is_empty() {
            return Err(ManifestError::MissingWeatherUrl);
        }
        if self.weather.timeout.is_zero() {
            return Err(ManifestError::ZeroWeatherTimeout);
        }
        if self.weather.max_len == 0 {
            return Err(ManifestError::ZeroWeatherMaxLen);
        }

        Ok(())
    }
}
