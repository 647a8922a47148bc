//! Block scheduler: runs each block at its own cadence from one loop.
//!
//! Every block remembers when it last ran. A tick refreshes the blocks that
//! are due and reports how long the caller may sleep before the next one is.
//! Time is passed in explicitly so the schedule can be tested without
//! sleeping.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::buffer::FragmentBuffer;
use crate::manifest::{BlockKind, Manifest, ManifestError};
use crate::source::{RefreshContext, Source, SourceError};

/// Sleep returned by a tick when there are no blocks at all.
pub const IDLE_SLEEP: Duration = Duration::from_secs(1);

/// One scheduled source with its timing state and current fragment.
#[derive(Debug)]
pub struct Block {
    source: Source,
    interval: Duration,
    last_run: Option<Instant>,
    buffer: FragmentBuffer,
    /// Whether the most recent refresh failed.
    failing: bool,
}

impl Block {
    pub fn new(source: Source, interval: Duration, capacity: usize) -> Self {
        Self {
            source,
            interval,
            last_run: None,
            buffer: FragmentBuffer::with_capacity(capacity),
            failing: false,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.source.kind()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_run(&self) -> Option<Instant> {
        self.last_run
    }

    /// The fragment currently on display for this block.
    pub fn fragment(&self) -> &str {
        self.buffer.as_str()
    }

    /// A block that never ran, or whose interval has fully elapsed, is due.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Time left until this block is due, zero if it already is.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_run {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }

    /// Refreshes the source into a scratch buffer and swaps it in on success.
    ///
    /// `last_run` moves to `now` either way, so a failing block is retried at
    /// its next regular deadline and not on every tick.
    pub fn run(&mut self, now: Instant, ctx: &RefreshContext<'_>) -> Result<(), SourceError> {
        self.last_run = Some(now);

        let mut scratch = FragmentBuffer::with_capacity(self.buffer.capacity());
        let result = self.source.refresh(ctx, &mut scratch);
        match &result {
            Ok(()) => {
                if scratch.is_truncated() {
                    debug!("{} fragment truncated to {} bytes", self.kind(), scratch.len());
                }
                self.buffer.replace_with(&scratch);
                if self.failing {
                    info!("{} block recovered", self.kind());
                }
                self.failing = false;
            }
            Err(e) => {
                if self.failing {
                    debug!("{} block still failing: {}", self.kind(), e);
                } else {
                    warn!("{} block failed, keeping last fragment: {}", self.kind(), e);
                }
                self.failing = true;
            }
        }
        result
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Blocks that were due and ran, in manifest order.
    pub ran: Vec<BlockKind>,
    /// Of those, the ones whose refresh failed.
    pub failed: Vec<BlockKind>,
    /// How long until the next block is due.
    pub sleep: Duration,
}

/// Owns the blocks in manifest order.
#[derive(Debug, Default)]
pub struct Scheduler {
    blocks: Vec<Block>,
}

impl Scheduler {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Builds one block per manifest entry, in manifest order.
    pub fn from_manifest(manifest: &Manifest) -> Result<Self, ManifestError> {
        let blocks = manifest
            .blocks
            .iter()
            .map(|spec| {
                let source = Source::from_manifest(spec.kind, manifest)?;
                Ok(Block::new(source, spec.interval, manifest.capacity))
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;
        Ok(Self::new(blocks))
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Runs every due block, then returns the time until the next deadline.
    pub fn tick(&mut self, now: Instant, ctx: &RefreshContext<'_>) -> TickReport {
        let mut ran = Vec::new();
        let mut failed = Vec::new();

        for block in &mut self.blocks {
            if block.is_due(now) {
                ran.push(block.kind());
                if block.run(now, ctx).is_err() {
                    failed.push(block.kind());
                }
            }
        }

        TickReport {
            ran,
            failed,
            sleep: self.next_sleep(now),
        }
    }

    /// The smallest remaining time across blocks.
    pub fn next_sleep(&self, now: Instant) -> Duration {
        self.blocks
            .iter()
            .map(|block| block.remaining(now))
            .min()
            .unwrap_or(IDLE_SLEEP)
    }
}
