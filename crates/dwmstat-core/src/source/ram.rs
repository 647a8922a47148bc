use crate::buffer::FragmentBuffer;
use crate::collector::procfs::parse_meminfo;

use super::{RefreshContext, SourceError};

/// RAM held by processes, excluding page cache and buffers.
#[derive(Debug)]
pub struct RamSource {
    usage_limit: f64,
    marker: String,
}

impl RamSource {
    pub fn new(usage_limit: f64, marker: String) -> Self {
        Self {
            usage_limit,
            marker,
        }
    }

    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        let meminfo = ctx.read(&ctx.proc_path.join("meminfo"))?;
        let usage = parse_meminfo(&meminfo)?.usage_percent();

        buf.append_alert(
            usage >= self.usage_limit,
            &self.marker,
            format_args!("[RAM {:.1}%]", usage),
        );
        Ok(())
    }
}
