use crate::buffer::FragmentBuffer;
use crate::collector::ThermalSensor;

use super::{RefreshContext, SourceError};

/// GPU temperature.
#[derive(Debug)]
pub struct GpuSource {
    sensor: ThermalSensor,
    temp_limit: f64,
    marker: String,
}

impl GpuSource {
    pub fn new(sensor: ThermalSensor, temp_limit: f64, marker: String) -> Self {
        Self {
            sensor,
            temp_limit,
            marker,
        }
    }

    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        let temp = self.sensor.read(ctx.fs, ctx.sys_path)?;
        buf.append_alert(
            temp >= self.temp_limit,
            &self.marker,
            format_args!("[GPU {:.1}ºC]", temp),
        );
        Ok(())
    }
}
