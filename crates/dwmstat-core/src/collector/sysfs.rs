//! Temperature sensors backed by sysfs `temp*_input` files.
//!
//! A sensor is either a fixed list of input files or an hwmon driver name
//! that is looked up under `<sys>/class/hwmon/hwmon*/name`. hwmon numbering
//! depends on probe order at boot, so looking the driver up by name is what
//! keeps a manifest valid across reboots.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::collector::procfs::parse_thermal;
use crate::collector::traits::FileSystem;

/// Default divisor turning sysfs millidegrees into degrees Celsius.
pub const MILLIDEGREES: f64 = 1000.0;

/// Where a temperature comes from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalSource {
    /// Explicit input files, averaged.
    Files(Vec<PathBuf>),
    /// An hwmon device identified by its driver name and the input files
    /// (e.g. `temp1_input`) to average inside it.
    Hwmon { driver: String, inputs: Vec<String> },
}

impl ThermalSource {
    /// An hwmon driver with a single `temp1_input`.
    pub fn hwmon(driver: impl Into<String>) -> Self {
        Self::Hwmon {
            driver: driver.into(),
            inputs: vec!["temp1_input".to_string()],
        }
    }
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no hwmon device with driver {0:?}")]
    NoDevice(String),
    #[error("none of {0} thermal inputs could be read")]
    NoReading(usize),
}

/// A temperature sensor with its hwmon lookup cached after first success.
#[derive(Debug, Clone)]
pub struct ThermalSensor {
    source: ThermalSource,
    divisor: f64,
    resolved: Option<Vec<PathBuf>>,
}

impl ThermalSensor {
    pub fn new(source: ThermalSource, divisor: f64) -> Self {
        Self {
            source,
            divisor,
            resolved: None,
        }
    }

    pub fn source(&self) -> &ThermalSource {
        &self.source
    }

    /// Reads every input and returns their average in degrees.
    pub fn read(&mut self, fs: &dyn FileSystem, sys_path: &Path) -> Result<f64, SensorError> {
        let inputs = match &self.resolved {
            Some(paths) => paths.clone(),
            None => self.resolve(fs, sys_path)?,
        };

        let mut sum = 0.0;
        let mut count = 0usize;
        for path in &inputs {
            match fs.read_to_string(path).ok().and_then(|c| parse_thermal(&c).ok()) {
                Some(value) => {
                    sum += value;
                    count += 1;
                }
                None => debug!("thermal input {} unreadable", path.display()),
            }
        }

        if count == 0 {
            // the device may have been renumbered; look it up again next time
            self.resolved = None;
            return Err(SensorError::NoReading(inputs.len()));
        }

        self.resolved = Some(inputs);
        Ok(sum / count as f64 / self.divisor)
    }

    fn resolve(&self, fs: &dyn FileSystem, sys_path: &Path) -> Result<Vec<PathBuf>, SensorError> {
        match &self.source {
            ThermalSource::Files(paths) => Ok(paths.clone()),
            ThermalSource::Hwmon { driver, inputs } => {
                let device = find_hwmon(fs, sys_path, driver)
                    .ok_or_else(|| SensorError::NoDevice(driver.clone()))?;
                debug!("hwmon driver {} found at {}", driver, device.display());
                Ok(inputs.iter().map(|input| device.join(input)).collect())
            }
        }
    }
}

/// Finds the first `hwmonN` directory whose `name` matches `driver`.
pub fn find_hwmon(fs: &dyn FileSystem, sys_path: &Path, driver: &str) -> Option<PathBuf> {
    let class = sys_path.join("class/hwmon");
    let mut devices = fs.read_dir(&class).ok()?;
    devices.sort();

    devices.into_iter().find(|device| {
        fs.read_to_string(&device.join("name"))
            .is_ok_and(|name| name.trim() == driver)
    })
}
