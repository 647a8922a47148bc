//! Mock providers for testing.
//!
//! `MockFs` plus pre-built scenarios let sources be exercised without a
//! Linux `/proc`, a sysfs hwmon tree or real mounts.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{TYPICAL_MEMINFO, TYPICAL_STAT};
