//! JSON output: the run summary, derived geometry and the event log.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use cachereplay_core::cache::CacheCounters;
use cachereplay_core::config::ReplayMode;
use cachereplay_core::events::CacheEvent;
use cachereplay_core::stats::{HitMissStats, SiuStats, UsageStats};
use cachereplay_core::{CacheGeometry, ReplayReport};

/// Geometry with its derived field widths.
#[derive(Debug, Serialize)]
pub struct GeometrySummary {
    arch_bits: u32,
    cache_size: u64,
    line_size: u32,
    associativity: u32,
    num_sets: u64,
    offset_bits: u32,
    index_bits: u32,
    tag_bits: u32,
}

impl From<&CacheGeometry> for GeometrySummary {
    fn from(g: &CacheGeometry) -> Self {
        Self {
            arch_bits: g.arch_bits,
            cache_size: g.cache_size,
            line_size: g.line_size,
            associativity: g.associativity,
            num_sets: g.num_sets(),
            offset_bits: g.offset_bits(),
            index_bits: g.index_bits(),
            tag_bits: g.tag_bits(),
        }
    }
}

#[derive(Debug, Serialize)]
struct UsageSummary {
    mean_ratio: f64,
    peak_valid: u64,
    samples: usize,
}

#[derive(Debug, Serialize)]
struct SiuSummary<'a> {
    evictions: u64,
    still_in_use: u64,
    siu_ratio: f64,
    mean_duration: f64,
    durations: &'a BTreeMap<u64, u64>,
}

/// Everything `cachereplay run` prints.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    geometry: GeometrySummary,
    mode: ReplayMode,
    passes: u8,
    instructions: u64,
    records: u64,
    last_time: u64,
    counters: CacheCounters,
    hit_ratio: f64,
    hits: &'a HitMissStats,
    usage: UsageSummary,
    siu: SiuSummary<'a>,
}

impl<'a> Summary<'a> {
    /// Collects the report and the sinks registered by `run`.
    pub fn new(
        geometry: &CacheGeometry,
        mode: ReplayMode,
        report: &ReplayReport,
        hits: &'a HitMissStats,
        usage: &UsageStats,
        siu: &'a SiuStats,
    ) -> Self {
        Self {
            geometry: GeometrySummary::from(geometry),
            mode,
            passes: report.passes,
            instructions: report.instructions,
            records: report.records,
            last_time: report.last_time,
            counters: report.counters,
            hit_ratio: hits.hit_ratio(),
            hits,
            usage: UsageSummary {
                mean_ratio: usage.mean_ratio(),
                peak_valid: usage.peak_valid,
                samples: usage.samples.len(),
            },
            siu: SiuSummary {
                evictions: siu.evictions,
                still_in_use: siu.still_in_use,
                siu_ratio: siu.siu_ratio(),
                mean_duration: siu.mean_duration(),
                durations: &siu.durations,
            },
        }
    }
}

/// Writes one JSON object per line.
///
/// # Errors
///
/// When the file cannot be created or written.
pub fn write_events(path: &Path, events: &[CacheEvent]) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("unable to create event log {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    tracing::debug!(events = events.len(), path = %path.display(), "event log written");
    Ok(())
}
