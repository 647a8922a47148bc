use chrono::Locale;

use crate::buffer::FragmentBuffer;

use super::{RefreshContext, SourceError};

/// Local date and time through a strftime pattern.
#[derive(Debug)]
pub struct ClockSource {
    format: String,
    locale: Locale,
}

impl ClockSource {
    pub fn new(format: String, locale: Locale) -> Self {
        Self { format, locale }
    }

    pub fn refresh(
        &mut self,
        ctx: &RefreshContext<'_>,
        buf: &mut FragmentBuffer,
    ) -> Result<(), SourceError> {
        buf.append(format_args!(
            "{}",
            ctx.now.format_localized(&self.format, self.locale)
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::source::testing::offline_context;

    fn render(format: &str, locale: Locale) -> String {
        let fs = MockFs::new();
        let ctx = offline_context(&fs);
        let mut buf = FragmentBuffer::with_capacity(64);
        ClockSource::new(format.to_string(), locale)
            .refresh(&ctx, &mut buf)
            .unwrap();
        buf.as_str().to_string()
    }

    #[test]
    fn default_pattern() {
        assert_eq!(
            render("[%A %B %d %H:%M]", Locale::en_US),
            "[Tuesday March 05 14:07]"
        );
    }

    #[test]
    fn localized_names() {
        assert_eq!(
            render("[%A %B %d %H:%M]", Locale::de_DE),
            "[Dienstag März 05 14:07]"
        );
    }

    #[test]
    fn custom_pattern() {
        assert_eq!(render("[%Y-%m-%d %H:%M]", Locale::en_US), "[2024-03-05 14:07]");
    }
}
