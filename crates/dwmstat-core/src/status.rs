//! Status line composition and change detection.

use tracing::debug;

use crate::publish::{PublishError, TitleSink};
use crate::scheduler::Block;

/// Concatenates the blocks' fragments in order, without separators.
pub fn compose(blocks: &[Block]) -> String {
    let len = blocks.iter().map(|b| b.fragment().len()).sum();
    let mut aggregate = String::with_capacity(len);
    for block in blocks {
        aggregate.push_str(block.fragment());
    }
    aggregate
}

/// Remembers the last successfully published aggregate.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value currently on display, `None` before the first publish.
    pub fn last_published(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn is_changed(&self, aggregate: &str) -> bool {
        self.last.as_deref() != Some(aggregate)
    }

    /// Publishes `aggregate` if it differs from the last published value.
    ///
    /// Returns whether the sink was called. When the sink fails the retained
    /// value stays as it was, so the same aggregate is offered again on the
    /// next call.
    pub fn publish_if_changed(
        &mut self,
        aggregate: &str,
        sink: &mut dyn TitleSink,
    ) -> Result<bool, PublishError> {
        if !self.is_changed(aggregate) {
            return Ok(false);
        }
        sink.set_title(aggregate)?;
        debug!("published {:?}", aggregate);
        self.last = Some(aggregate.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::publish::testing::RecordingSink;
    use crate::scheduler::Scheduler;
    use crate::source::testing::offline_context;
    use crate::source::{RamSource, Source};
    use std::time::{Duration, Instant};

    #[test]
    fn identical_aggregate_is_not_republished() {
        let mut sink = RecordingSink::new();
        let mut detector = ChangeDetector::new();

        let line = "[CPU 10.0% 40C][RAM 20%]";
        assert!(detector.publish_if_changed(line, &mut sink).unwrap());
        assert!(!detector.publish_if_changed(line, &mut sink).unwrap());
        assert_eq!(sink.titles(), vec![line.to_string()]);
    }

    #[test]
    fn changed_aggregate_publishes_exactly_once() {
        let mut sink = RecordingSink::new();
        let mut detector = ChangeDetector::new();

        detector
            .publish_if_changed("[CPU 10.0% 40C][RAM 20%]", &mut sink)
            .unwrap();
        assert!(detector
            .publish_if_changed("[CPU 12.0% 40C][RAM 20%]", &mut sink)
            .unwrap());
        assert_eq!(sink.titles().len(), 2);
        assert_eq!(detector.last_published(), Some("[CPU 12.0% 40C][RAM 20%]"));
    }

    #[test]
    fn empty_first_aggregate_still_publishes() {
        let mut sink = RecordingSink::new();
        let mut detector = ChangeDetector::new();
        assert_eq!(detector.last_published(), None);
        assert!(detector.publish_if_changed("", &mut sink).unwrap());
        assert!(!detector.publish_if_changed("", &mut sink).unwrap());
        assert_eq!(sink.titles(), vec![String::new()]);
    }

    #[test]
    fn failed_publish_is_retried() {
        let mut sink = RecordingSink::new();
        let mut detector = ChangeDetector::new();
        detector.publish_if_changed("a", &mut sink).unwrap();

        sink.fail_next(1);
        assert!(detector.publish_if_changed("b", &mut sink).is_err());
        assert_eq!(detector.last_published(), Some("a"));

        assert!(detector.publish_if_changed("b", &mut sink).unwrap());
        assert_eq!(sink.titles(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn compose_concatenates_in_block_order() {
        let fs = MockFs::typical_desktop();
        let ctx = offline_context(&fs);
        let ram = |interval| {
            Block::new(
                Source::Ram(RamSource::new(90.0, "!".to_string())),
                Duration::from_secs(interval),
                64,
            )
        };
        let mut scheduler = Scheduler::new(vec![ram(1), ram(60)]);
        assert_eq!(compose(scheduler.blocks()), "");

        let t0 = Instant::now();
        scheduler.tick(t0, &ctx);
        assert_eq!(compose(scheduler.blocks()), "[RAM 34.4%][RAM 34.4%]");

        // only the first block is due; the second keeps its fragment
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemFree: 500 kB\n");
        scheduler.tick(t0 + Duration::from_secs(1), &ctx);
        assert_eq!(compose(scheduler.blocks()), "[RAM 50.0%][RAM 34.4%]");
    }
}
