//! Parsers for `/proc` and sysfs files.
//!
//! These are pure functions that parse the content of provider files into
//! structured data. They are designed to be easily testable with string inputs.

use thiserror::Error;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Cumulative CPU counters from the aggregate `cpu` line of `/proc/stat`.
///
/// Values are in USER_HZ ticks since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTotals {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTotals {
    /// Ticks spent doing work.
    pub fn active(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
    }

    /// Active plus idle ticks.
    pub fn total(&self) -> u64 {
        self.active().saturating_add(self.idle)
    }
}

/// Parses the aggregate `cpu` line of `/proc/stat`.
///
/// Format: `cpu  user nice system idle iowait irq softirq ...`
pub fn parse_cpu_totals(content: &str) -> Result<CpuTotals, ParseError> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| ParseError::new("missing aggregate cpu line in stat"))?;

    let fields: Vec<&str> = line.split_whitespace().skip(1).collect();
    if fields.len() < 4 {
        return Err(ParseError::new(format!(
            "not enough fields in cpu line: expected 4+, got {}",
            fields.len()
        )));
    }

    let parse_field = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(CpuTotals {
        user: parse_field(0, "user")?,
        nice: parse_field(1, "nice")?,
        system: parse_field(2, "system")?,
        idle: parse_field(3, "idle")?,
    })
}

/// The `/proc/meminfo` fields the RAM block needs, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub buffers: u64,
    pub cached: u64,
}

impl MemInfo {
    /// Memory held by processes: `(total - free) - (cached + buffers)`.
    pub fn used(&self) -> u64 {
        self.mem_total
            .saturating_sub(self.mem_free)
            .saturating_sub(self.cached.saturating_add(self.buffers))
    }

    /// Used share of total memory in percent, `0.0` when total is zero.
    pub fn usage_percent(&self) -> f64 {
        crate::fmt::percent(self.used(), self.mem_total)
    }
}

/// Parses `/proc/meminfo` content.
///
/// `MemTotal` is required; the other fields default to zero when absent.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut saw_total = false;

    let parse_kb = |line: &str| -> Result<u64, ParseError> {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ParseError::new(format!("invalid meminfo line: {:?}", line)))
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line)?;
            saw_total = true;
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line)?;
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line)?;
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line)?;
        }
    }

    if !saw_total {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }

    Ok(info)
}

/// Parses a sysfs thermal input (`temp*_input`): one integer, usually
/// millidegrees Celsius.
pub fn parse_thermal(content: &str) -> Result<f64, ParseError> {
    let raw = content.trim();
    raw.parse::<i64>()
        .map(|v| v as f64)
        .or_else(|_| raw.parse::<f64>())
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError::new(format!("invalid thermal reading: {:?}", raw)))
}
