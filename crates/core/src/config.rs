//! Configuration system for the cache replay engine.
//!
//! This module defines the configuration structures used to parameterize a replay. It provides:
//! 1. **Defaults:** Baseline cache geometry and replay settings.
//! 2. **Geometry:** The cache shape and every width derived from it, with validation.
//! 3. **Replay:** Pass selection and the logical start time.
//!
//! Configuration is supplied as JSON (see [`Config::from_json`]) or built with
//! `Config::default()` and field overrides.

use serde::{Deserialize, Serialize};

use crate::common::error::{GeometryError, SimError};

/// Default configuration constants.
///
/// These values apply whenever a field is omitted from a JSON configuration.
mod defaults {
    /// Default architecture address width (64-bit).
    pub const ARCH_BITS: u32 = 64;

    /// Default total cache size in bytes (32 KiB).
    pub const CACHE_SIZE: u64 = 32 * 1024;

    /// Default cache line size in bytes (64 bytes).
    ///
    /// Matches typical modern processor cache line sizes.
    pub const LINE_SIZE: u32 = 64;

    /// Default associativity (8 ways).
    pub const ASSOCIATIVITY: u32 = 8;

    /// Default logical time at which replay starts.
    pub const START_TIME: u64 = 0;
}

/// Shape of the simulated cache.
///
/// # Examples
///
/// ```
/// use cachereplay_core::config::CacheGeometry;
///
/// let geometry = CacheGeometry::new(16, 256, 16, 2);
/// assert!(geometry.validate().is_ok());
/// assert_eq!(geometry.num_sets(), 8);
/// assert_eq!(geometry.offset_bits(), 4);
/// assert_eq!(geometry.index_bits(), 3);
/// assert_eq!(geometry.tag_bits(), 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    /// Architecture address width in bits.
    #[serde(default = "CacheGeometry::default_arch_bits")]
    pub arch_bits: u32,

    /// Total cache capacity in bytes.
    #[serde(default = "CacheGeometry::default_cache_size")]
    pub cache_size: u64,

    /// Line (block) size in bytes.
    #[serde(default = "CacheGeometry::default_line_size")]
    pub line_size: u32,

    /// Number of ways per set.
    #[serde(default = "CacheGeometry::default_associativity", alias = "ways")]
    pub associativity: u32,
}

impl CacheGeometry {
    /// Creates a geometry from its four parameters without validating it.
    pub const fn new(arch_bits: u32, cache_size: u64, line_size: u32, associativity: u32) -> Self {
        Self {
            arch_bits,
            cache_size,
            line_size,
            associativity,
        }
    }

    /// Checks that the geometry yields a power-of-two set count and a positive tag width.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeometryError`] found, checking zero fields first, then the
    /// address width, line size, divisibility, set count and finally the tag width.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.cache_size == 0 {
            return Err(GeometryError::Zero {
                field: "cache_size",
            });
        }
        if self.line_size == 0 {
            return Err(GeometryError::Zero { field: "line_size" });
        }
        if self.associativity == 0 {
            return Err(GeometryError::Zero {
                field: "associativity",
            });
        }
        if self.arch_bits == 0 || self.arch_bits > 64 {
            return Err(GeometryError::ArchBits {
                arch_bits: self.arch_bits,
            });
        }
        if !self.line_size.is_power_of_two() {
            return Err(GeometryError::LineSize {
                line_size: self.line_size as u64,
            });
        }

        let way_bytes = self.associativity as u64 * self.line_size as u64;
        if self.cache_size % way_bytes != 0 {
            return Err(GeometryError::Indivisible {
                cache_size: self.cache_size,
                way_bytes,
            });
        }

        let num_sets = self.cache_size / way_bytes;
        if !num_sets.is_power_of_two() {
            return Err(GeometryError::SetCount { num_sets });
        }

        let tag_bits =
            self.arch_bits as i64 - self.index_bits() as i64 - self.offset_bits() as i64;
        if tag_bits <= 0 {
            return Err(GeometryError::TagBits {
                tag_bits,
                arch_bits: self.arch_bits,
                index_bits: self.index_bits(),
                offset_bits: self.offset_bits(),
            });
        }
        Ok(())
    }

    /// Number of sets: `cache_size / (associativity * line_size)`.
    ///
    /// Zero when a divisor is zero; only meaningful after [`validate`](Self::validate).
    pub const fn num_sets(&self) -> u64 {
        let way_bytes = self.associativity as u64 * self.line_size as u64;
        if way_bytes == 0 {
            0
        } else {
            self.cache_size / way_bytes
        }
    }

    /// Width of the byte offset field, `log2(line_size)`.
    pub const fn offset_bits(&self) -> u32 {
        if self.line_size == 0 {
            0
        } else {
            self.line_size.ilog2()
        }
    }

    /// Width of the set index field, `log2(num_sets)`.
    pub const fn index_bits(&self) -> u32 {
        let sets = self.num_sets();
        if sets == 0 { 0 } else { sets.ilog2() }
    }

    /// Width of the tag field: `arch_bits - index_bits - offset_bits`, saturating at zero.
    pub const fn tag_bits(&self) -> u32 {
        self.arch_bits
            .saturating_sub(self.index_bits())
            .saturating_sub(self.offset_bits())
    }

    /// Returns the default architecture width.
    fn default_arch_bits() -> u32 {
        defaults::ARCH_BITS
    }

    /// Returns the default cache size.
    fn default_cache_size() -> u64 {
        defaults::CACHE_SIZE
    }

    /// Returns the default line size.
    fn default_line_size() -> u32 {
        defaults::LINE_SIZE
    }

    /// Returns the default associativity.
    fn default_associativity() -> u32 {
        defaults::ASSOCIATIVITY
    }
}

impl Default for CacheGeometry {
    fn default() -> Self {
        Self {
            arch_bits: defaults::ARCH_BITS,
            cache_size: defaults::CACHE_SIZE,
            line_size: defaults::LINE_SIZE,
            associativity: defaults::ASSOCIATIVITY,
        }
    }
}

/// How many passes a replay makes over the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReplayMode {
    /// Two passes when any registered sink asks for lookahead, one otherwise.
    #[default]
    #[serde(alias = "auto")]
    Auto,
    /// One pass; lookahead sinks must resolve evictions retroactively.
    #[serde(alias = "single", alias = "Single")]
    SinglePass,
    /// A lookahead-only pass followed by a full pass over a fresh cache.
    #[serde(alias = "two", alias = "Two")]
    TwoPass,
}

/// Replay controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Pass selection.
    #[serde(default)]
    pub mode: ReplayMode,

    /// Logical clock value before the first record; every pass resets to it.
    #[serde(default = "ReplayConfig::default_start_time")]
    pub start_time: u64,
}

impl ReplayConfig {
    /// Returns the default start time.
    fn default_start_time() -> u64 {
        defaults::START_TIME
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            mode: ReplayMode::Auto,
            start_time: defaults::START_TIME,
        }
    }
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use cachereplay_core::config::{Config, ReplayMode};
///
/// let json = r#"{
///     "geometry": { "arch_bits": 32, "cache_size": 4096, "line_size": 32, "ways": 4 },
///     "replay": { "mode": "TwoPass" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.geometry.associativity, 4);
/// assert_eq!(config.geometry.num_sets(), 32);
/// assert_eq!(config.replay.mode, ReplayMode::TwoPass);
/// assert_eq!(config.replay.start_time, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cache shape.
    #[serde(default)]
    pub geometry: CacheGeometry,
    /// Replay settings.
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Errors produced while loading a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON text could not be deserialized.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration parsed but describes an impossible cache.
    #[error(transparent)]
    Invalid(#[from] SimError),
}

impl Config {
    /// Parses a JSON configuration and validates its geometry.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Json`] on malformed input, [`ConfigError::Invalid`] when the
    /// geometry fails [`CacheGeometry::validate`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.geometry.validate().map_err(SimError::from)?;
        Ok(config)
    }
}
