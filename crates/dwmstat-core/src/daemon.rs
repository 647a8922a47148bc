//! The status loop: refresh due blocks, compose, publish on change, sleep.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, info, warn};

use crate::collector::{FileSystem, HttpFetch};
use crate::fmt::format_duration;
use crate::manifest::{Manifest, ManifestError};
use crate::publish::TitleSink;
use crate::scheduler::Scheduler;
use crate::shutdown::Shutdown;
use crate::source::RefreshContext;
use crate::status::{ChangeDetector, compose};

/// Result of one loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Whether the sink received a new title.
    pub published: bool,
    /// Whether the sink rejected the title.
    pub publish_failed: bool,
    /// Time until the next block is due.
    pub sleep: Duration,
}

/// Owns every piece of runtime state of the status feeder.
pub struct Daemon<F: FileSystem> {
    scheduler: Scheduler,
    detector: ChangeDetector,
    sink: Box<dyn TitleSink>,
    fs: F,
    http: Box<dyn HttpFetch>,
    proc_path: PathBuf,
    sys_path: PathBuf,
    publish_count: u64,
}

impl<F: FileSystem> Daemon<F> {
    pub fn new(
        manifest: &Manifest,
        fs: F,
        http: Box<dyn HttpFetch>,
        sink: Box<dyn TitleSink>,
    ) -> Result<Self, ManifestError> {
        Ok(Self {
            scheduler: Scheduler::from_manifest(manifest)?,
            detector: ChangeDetector::new(),
            sink,
            fs,
            http,
            proc_path: manifest.proc_path.clone(),
            sys_path: manifest.sys_path.clone(),
            publish_count: 0,
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The last title the sink accepted.
    pub fn last_published(&self) -> Option<&str> {
        self.detector.last_published()
    }

    pub fn publish_count(&self) -> u64 {
        self.publish_count
    }

    /// One iteration at monotonic time `now` and local wall-clock `wall`.
    ///
    /// A sink error is logged and the same aggregate is offered again on the
    /// next tick.
    pub fn tick(&mut self, now: Instant, wall: DateTime<FixedOffset>) -> TickOutcome {
        let ctx = RefreshContext {
            fs: &self.fs,
            http: self.http.as_ref(),
            proc_path: &self.proc_path,
            sys_path: &self.sys_path,
            now: wall,
        };
        let report = self.scheduler.tick(now, &ctx);
        if !report.ran.is_empty() {
            debug!(
                "refreshed {} block(s), {} failed",
                report.ran.len(),
                report.failed.len()
            );
        }

        let aggregate = compose(self.scheduler.blocks());
        let (published, publish_failed) =
            match self.detector.publish_if_changed(&aggregate, self.sink.as_mut()) {
                Ok(published) => (published, false),
                Err(e) => {
                    warn!("publish failed, retrying next tick: {}", e);
                    (false, true)
                }
            };
        if published {
            self.publish_count += 1;
        }

        TickOutcome {
            published,
            publish_failed,
            sleep: report.sleep,
        }
    }

    /// Runs a single iteration against the real clocks.
    ///
    /// The sleep is measured again once the iteration is over, so time spent
    /// in a slow refresh counts against the other blocks' deadlines.
    pub fn run_once(&mut self) -> TickOutcome {
        let mut outcome = self.tick(Instant::now(), Local::now().fixed_offset());
        outcome.sleep = self.scheduler.next_sleep(Instant::now());
        outcome
    }

    /// Loops until `shutdown` is requested.
    ///
    /// The flag is checked before every tick and during the sleep, never in
    /// the middle of a refresh.
    pub fn run(&mut self, shutdown: &Shutdown) {
        info!("status loop started with {} block(s)", self.scheduler.blocks().len());

        while !shutdown.is_requested() {
            let outcome = self.run_once();
            debug!("sleeping {}", format_duration(outcome.sleep));
            shutdown.sleep(outcome.sleep);
        }

        info!("status loop stopped after {} publish(es)", self.publish_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::http::testing::ScriptedFetch;
    use crate::collector::{FetchError, MockFs, Offline};
    use crate::manifest::BlockKind;
    use crate::publish::testing::RecordingSink;
    use crate::source::testing::fixed_now;

    fn daemon(
        manifest: &Manifest,
        fs: MockFs,
        http: Box<dyn HttpFetch>,
    ) -> (Daemon<MockFs>, RecordingSink) {
        let sink = RecordingSink::new();
        let daemon = Daemon::new(manifest, fs, http, Box::new(sink.clone())).unwrap();
        (daemon, sink)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn first_tick_publishes_the_full_line() {
        let manifest =
            Manifest::default().with_blocks(&[BlockKind::Gpu, BlockKind::Ram, BlockKind::Clock]);
        let (mut daemon, sink) = daemon(&manifest, MockFs::typical_desktop(), Box::new(Offline));

        let outcome = daemon.tick(Instant::now(), fixed_now());
        assert!(outcome.published);
        assert_eq!(outcome.sleep, secs(1));
        assert_eq!(
            sink.titles(),
            vec!["[GPU 52.0ºC][RAM 34.4%][Tuesday March 05 14:07]".to_string()]
        );
    }

    #[test]
    fn unchanged_line_is_published_once() {
        let manifest = Manifest::default().with_blocks(&[BlockKind::Ram, BlockKind::Clock]);
        let (mut daemon, sink) = daemon(&manifest, MockFs::typical_desktop(), Box::new(Offline));
        let t0 = Instant::now();

        for i in 0..5 {
            daemon.tick(t0 + secs(i * 2), fixed_now());
        }
        assert_eq!(sink.titles().len(), 1);
        assert_eq!(daemon.publish_count(), 1);
    }

    #[test]
    fn changed_value_is_republished() {
        let manifest = Manifest::default().with_blocks(&[BlockKind::Ram]);
        let fs = MockFs::typical_desktop();
        let (mut daemon, sink) = daemon(&manifest, fs.clone(), Box::new(Offline));
        let t0 = Instant::now();

        daemon.tick(t0, fixed_now());
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemFree: 100 kB\n");
        // not due yet
        assert!(!daemon.tick(t0 + secs(1), fixed_now()).published);
        assert!(daemon.tick(t0 + secs(2), fixed_now()).published);
        assert_eq!(sink.titles()[1], "![RAM 90.0%]");
    }

    #[test]
    fn weather_failure_keeps_last_text() {
        let mut manifest = Manifest::default().with_blocks(&[BlockKind::Weather]);
        manifest.set_interval(BlockKind::Weather, secs(60));
        let http = ScriptedFetch::new();
        http.push(Ok("Clear 25C\n"));
        http.push(Err(FetchError::Timeout));
        let (mut daemon, sink) = daemon(&manifest, MockFs::new(), Box::new(http));
        let t0 = Instant::now();

        daemon.tick(t0, fixed_now());
        let outcome = daemon.tick(t0 + secs(60), fixed_now());
        assert!(!outcome.published);
        assert_eq!(daemon.last_published(), Some("[Clear 25C]"));
        assert_eq!(sink.titles(), vec!["[Clear 25C]".to_string()]);
    }

    #[test]
    fn empty_manifest_publishes_empty_title_once() {
        let manifest = Manifest::default().with_blocks(&[]);
        let (mut daemon, sink) = daemon(&manifest, MockFs::new(), Box::new(Offline));

        let outcome = daemon.tick(Instant::now(), fixed_now());
        assert!(outcome.published);
        assert_eq!(outcome.sleep, crate::scheduler::IDLE_SLEEP);
        assert!(!daemon.tick(Instant::now(), fixed_now()).published);
        assert_eq!(sink.titles(), vec![String::new()]);
    }

    #[test]
    fn sink_error_is_retried_on_next_tick() {
        let manifest = Manifest::default().with_blocks(&[BlockKind::Ram]);
        let (mut daemon, sink) = daemon(&manifest, MockFs::typical_desktop(), Box::new(Offline));
        sink.fail_next(1);
        let t0 = Instant::now();

        let outcome = daemon.tick(t0, fixed_now());
        assert!(!outcome.published);
        assert!(outcome.publish_failed);
        assert_eq!(daemon.last_published(), None);
        let outcome = daemon.tick(t0 + secs(1), fixed_now());
        assert!(outcome.published);
        assert!(!outcome.publish_failed);
        assert_eq!(sink.titles(), vec!["[RAM 34.4%]".to_string()]);
    }

    /// Answers every request after a fixed delay.
    struct SlowFetch {
        delay: Duration,
    }

    impl HttpFetch for SlowFetch {
        fn get(&self, _url: &str, _timeout: Duration) -> Result<String, FetchError> {
            std::thread::sleep(self.delay);
            Ok("Clear 25C".to_string())
        }
    }

    #[test]
    fn slow_refresh_shortens_the_following_sleep() {
        let mut manifest = Manifest::default().with_blocks(&[BlockKind::Ram, BlockKind::Weather]);
        manifest.set_interval(BlockKind::Ram, secs(1));
        manifest.set_interval(BlockKind::Weather, secs(60));
        let http = SlowFetch {
            delay: Duration::from_millis(1200),
        };
        let (mut daemon, sink) = daemon(&manifest, MockFs::typical_desktop(), Box::new(http));

        // the RAM block is already overdue once the weather request returns
        let outcome = daemon.run_once();
        assert_eq!(outcome.sleep, Duration::ZERO);
        assert_eq!(sink.titles(), vec!["[RAM 34.4%][Clear 25C]".to_string()]);
    }

    #[test]
    fn run_returns_once_shutdown_is_requested() {
        let manifest = Manifest::default().with_blocks(&[BlockKind::Ram]);
        let (mut daemon, sink) = daemon(&manifest, MockFs::typical_desktop(), Box::new(Offline));
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            remote.request();
        });

        daemon.run(&shutdown);
        stopper.join().unwrap();
        assert_eq!(sink.titles(), vec!["[RAM 34.4%]".to_string()]);
    }
}
