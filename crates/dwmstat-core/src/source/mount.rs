use tracing::debug;

use crate::buffer::FragmentBuffer;
use crate::manifest::MountPoint;

use super::{RefreshContext, SourceError};

/// Usage of every watched filesystem, as one bracketed group.
#[derive(Debug)]
pub struct MountSource {
    mounts: Vec<MountPoint>,
    usage_limit: f64,
    marker: String,
}

impl MountSource {
    pub fn new(mounts: Vec<MountPoint>, usage_limit: f64, marker: String) -> Self {
        Self {
            mounts,
            usage_limit,
            marker,
        }
    }

    /// Renders `[LABEL1 p1% LABEL2 p2%]`.
    ///
    /// A filesystem that cannot be queried shows as `LABEL -`; the block only
    /// fails when none of them can.
    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        let readings: Vec<Option<f64>> = self
            .mounts
            .iter()
            .map(|mount| match ctx.fs.fs_stats(&mount.path) {
                Ok(stats) => Some(stats.used_percent()),
                Err(e) => {
                    debug!("statvfs {} failed: {}", mount.path.display(), e);
                    None
                }
            })
            .collect();

        if !readings.is_empty() && readings.iter().all(Option::is_none) {
            return Err(SourceError::Unusable("no watched filesystem could be read"));
        }

        let alert = readings.iter().flatten().any(|&p| p >= self.usage_limit);
        buf.append_alert(alert, &self.marker, format_args!("["));
        for (i, (mount, reading)) in self.mounts.iter().zip(&readings).enumerate() {
            if i > 0 {
                buf.append(format_args!(" "));
            }
            match reading {
                Some(p) => buf.append(format_args!("{} {:.1}%", mount.label, p)),
                None => buf.append(format_args!("{} -", mount.label)),
            }
        }
        buf.append(format_args!("]"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::source::testing::offline_context;

    fn render(mounts: &[(&str, &str)], limit: f64, fs: &MockFs) -> Result<String, SourceError> {
        let mounts = mounts
            .iter()
            .map(|(path, label)| MountPoint::new(*path, *label))
            .collect();
        let ctx = offline_context(fs);
        let mut buf = FragmentBuffer::with_capacity(64);
        MountSource::new(mounts, limit, "!".to_string()).refresh(&ctx, &mut buf)?;
        Ok(buf.as_str().to_string())
    }

    #[test]
    fn groups_mounts_without_trailing_space() {
        let fs = MockFs::typical_desktop();
        assert_eq!(
            render(&[("/", "root"), ("/home", "home")], 95.0, &fs).unwrap(),
            "[root 40.0% home 75.0%]"
        );
    }

    #[test]
    fn alert_when_any_mount_reaches_the_limit() {
        let fs = MockFs::typical_desktop();
        assert_eq!(
            render(&[("/", "root"), ("/home", "home")], 75.0, &fs).unwrap(),
            "![root 40.0% home 75.0%]"
        );
    }

    #[test]
    fn unreadable_mount_renders_a_dash() {
        let fs = MockFs::typical_desktop();
        assert_eq!(
            render(&[("/", "root"), ("/mnt/usb", "usb")], 95.0, &fs).unwrap(),
            "[root 40.0% usb -]"
        );
    }

    #[test]
    fn all_mounts_unreadable_is_an_error() {
        let fs = MockFs::new();
        assert!(matches!(
            render(&[("/mnt/usb", "usb")], 95.0, &fs),
            Err(SourceError::Unusable(_))
        ));
    }

    #[test]
    fn zero_sized_filesystem_is_zero_percent() {
        let fs = MockFs::new();
        fs.add_mount("/proc", 0, 0);
        assert_eq!(render(&[("/proc", "proc")], 95.0, &fs).unwrap(), "[proc 0.0%]");
    }

    #[test]
    fn no_mounts_renders_empty_group() {
        let fs = MockFs::new();
        assert_eq!(render(&[], 95.0, &fs).unwrap(), "[]");
    }
}
