//! Parsers for the Linux `/proc` and sysfs text providers.
//!
//! These are pure functions over file contents; the sources do the reading.

pub mod parser;

pub use parser::{CpuTotals, MemInfo, ParseError, parse_cpu_totals, parse_meminfo, parse_thermal};
