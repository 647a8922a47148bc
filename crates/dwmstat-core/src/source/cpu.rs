use crate::buffer::FragmentBuffer;
use crate::collector::ThermalSensor;
use crate::collector::procfs::{CpuTotals, parse_cpu_totals};
use crate::fmt::percent;

use super::{RefreshContext, SourceError};

/// CPU usage since the previous sample plus CPU temperature.
#[derive(Debug)]
pub struct CpuSource {
    sensor: ThermalSensor,
    usage_limit: f64,
    temp_limit: f64,
    marker: String,
    /// Counters from the last successful refresh. All-zero before the first
    /// one, so the first reading is the average since boot.
    prev: CpuTotals,
}

impl CpuSource {
    pub fn new(sensor: ThermalSensor, usage_limit: f64, temp_limit: f64, marker: String) -> Self {
        Self {
            sensor,
            usage_limit,
            temp_limit,
            marker,
            prev: CpuTotals::default(),
        }
    }

    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        let stat = ctx.read(&ctx.proc_path.join("stat"))?;
        let cur = parse_cpu_totals(&stat)?;
        let temp = self.sensor.read(ctx.fs, ctx.sys_path)?;

        let usage = usage_between(&self.prev, &cur);
        self.prev = cur;

        let alert = usage >= self.usage_limit || temp >= self.temp_limit;
        buf.append_alert(
            alert,
            &self.marker,
            format_args!("[CPU {:04.1}% {:.1}ºC]", usage, temp),
        );
        Ok(())
    }
}

/// Share of ticks spent active between two samples, in percent.
///
/// Counters that went backwards count as zero progress, and two identical
/// samples give `0.0`.
pub fn usage_between(prev: &CpuTotals, cur: &CpuTotals) -> f64 {
    let active = cur.active().saturating_sub(prev.active());
    let total = cur.total().saturating_sub(prev.total());
    percent(active, total)
}
