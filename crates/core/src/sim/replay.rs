//! Replay controller.
//!
//! Drives a fresh [`Cache`] through an ordered trace, one instruction at a time, and
//! optionally twice. It performs:
//! 1. **Grouping:** Consecutive records with equal time form one instruction.
//! 2. **Commit:** After each instruction every active sink sees `commit(time)`.
//! 3. **Flush:** At stream end the cache is flushed at the last time and committed once more.
//! 4. **Passes:** In two-pass mode a lookahead-only pass precedes the full pass, each over
//!    its own cache with the clock reset to the configured start time.

use tracing::{debug, error, info};

use super::instruction::Instructions;
use crate::cache::lifetime::LifetimeTracker;
use crate::cache::{Cache, CacheCounters};
use crate::common::data::AccessRecord;
use crate::common::error::SimError;
use crate::config::{CacheGeometry, Config, ReplayConfig, ReplayMode};
use crate::events::{EventSink, Pass, SinkSet};

/// Controller lifecycle.
///
/// `Idle -> Running(pass) -> Flushed(pass) [-> Running(Second) -> Flushed(Second)] -> Done`,
/// or `Aborted` once any pass fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayState {
    /// No replay started yet.
    Idle,
    /// A pass is applying records.
    Running(Pass),
    /// A pass has flushed its cache.
    Flushed(Pass),
    /// All passes finished.
    Done,
    /// A pass failed; the error was returned from [`ReplayController::run`].
    Aborted,
}

/// Outcome of the retained pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayReport {
    /// Pass the numbers below come from.
    pub pass: Pass,
    /// Number of passes made over the trace.
    pub passes: u8,
    /// Instructions committed.
    pub instructions: u64,
    /// Records applied.
    pub records: u64,
    /// Time of the last record (the flush time), or the start time for an empty trace.
    pub last_time: u64,
    /// Cache totals, including the evictions performed by the final flush.
    pub counters: CacheCounters,
    /// Block lifetime intervals; every alive interval is closed.
    pub lifetimes: LifetimeTracker,
}

/// Replays traces against one cache geometry.
#[derive(Debug)]
pub struct ReplayController {
    geometry: CacheGeometry,
    config: ReplayConfig,
    state: ReplayState,
    clock: u64,
}

impl ReplayController {
    /// Creates a controller, validating `geometry` up front.
    ///
    /// # Errors
    ///
    /// [`SimError::Geometry`] if the geometry is invalid.
    pub fn new(geometry: CacheGeometry, config: ReplayConfig) -> Result<Self, SimError> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            config,
            state: ReplayState::Idle,
            clock: config.start_time,
        })
    }

    /// Creates a controller from a root [`Config`].
    ///
    /// # Errors
    ///
    /// [`SimError::Geometry`] if the geometry is invalid.
    pub fn from_config(config: &Config) -> Result<Self, SimError> {
        Self::new(config.geometry, config.replay)
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ReplayState {
        self.state
    }

    /// Logical time of the most recently started instruction.
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    /// Geometry every pass builds its cache from.
    pub const fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Whether a replay with `sinks` registered makes two passes.
    pub fn is_two_pass(&self, sinks: &[&mut dyn EventSink]) -> bool {
        match self.config.mode {
            ReplayMode::Auto => sinks.iter().any(|s| s.lookahead()),
            ReplayMode::SinglePass => false,
            ReplayMode::TwoPass => true,
        }
    }

    /// Replays `records` and reports the retained pass.
    ///
    /// Sinks receive events in registration order. In two-pass mode only lookahead sinks
    /// take part in the first pass.
    ///
    /// # Errors
    ///
    /// Any [`SimError`] raised by a pass; the controller is left [`ReplayState::Aborted`].
    /// [`SimError::UnorderedTrace`] when a record's time is below its predecessor's or
    /// below the configured start time.
    pub fn run(
        &mut self,
        records: &[AccessRecord],
        sinks: &mut [&mut dyn EventSink],
    ) -> Result<ReplayReport, SimError> {
        let two_pass = self.is_two_pass(sinks);
        let result = if two_pass {
            self.run_two_passes(records, sinks)
        } else {
            self.run_pass(Pass::Single, records, &mut SinkSet::new(sinks))
        };

        match result {
            Ok(mut report) => {
                report.passes = if two_pass { 2 } else { 1 };
                self.state = ReplayState::Done;
                info!(
                    passes = report.passes,
                    instructions = report.instructions,
                    hits = report.counters.hits,
                    misses = report.counters.misses,
                    evictions = report.counters.evictions,
                    "replay finished"
                );
                Ok(report)
            }
            Err(err) => {
                self.state = ReplayState::Aborted;
                Err(err)
            }
        }
    }

    fn run_two_passes(
        &mut self,
        records: &[AccessRecord],
        sinks: &mut [&mut dyn EventSink],
    ) -> Result<ReplayReport, SimError> {
        let _ = self.run_pass(Pass::First, records, &mut SinkSet::lookahead_only(sinks))?;
        self.run_pass(Pass::Second, records, &mut SinkSet::new(sinks))
    }

    fn run_pass(
        &mut self,
        pass: Pass,
        records: &[AccessRecord],
        sink: &mut SinkSet<'_, '_>,
    ) -> Result<ReplayReport, SimError> {
        let span = tracing::debug_span!("replay_pass", ?pass);
        let _enter = span.enter();

        let mut cache = Cache::new(&self.geometry)?;
        self.clock = self.config.start_time;
        self.state = ReplayState::Running(pass);
        sink.begin_pass(pass);
        debug!(records = records.len(), sinks = sink.active(), "pass started");

        let mut instructions = 0u64;
        for instruction in Instructions::new(records) {
            if instruction.time < self.clock {
                let err = SimError::UnorderedTrace {
                    time: instruction.time,
                    previous: self.clock,
                };
                error!(%err, "replay aborted");
                return Err(err);
            }
            self.clock = instruction.time;
            for record in instruction.records {
                if let Err(err) = cache.access(record, sink) {
                    error!(
                        time = record.time,
                        thread = record.thread,
                        addr = record.addr,
                        size = record.size,
                        %err,
                        "replay aborted"
                    );
                    return Err(err);
                }
            }
            sink.commit(instruction.time);
            instructions += 1;
        }

        cache.flush(self.clock, sink)?;
        sink.commit(self.clock);
        self.state = ReplayState::Flushed(pass);

        let counters = *cache.counters();
        debug!(
            instructions,
            sub_accesses = counters.sub_accesses,
            fetches = counters.fetches,
            writebacks = counters.writebacks,
            "pass flushed"
        );
        Ok(ReplayReport {
            pass,
            passes: 1,
            instructions,
            records: records.len() as u64,
            last_time: self.clock,
            counters,
            lifetimes: cache.into_lifetimes(),
        })
    }
}
