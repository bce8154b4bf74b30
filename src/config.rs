//! Pipeline configuration and per-frame parameters
//!
//! `OceanConfig` is fixed for a pipeline's lifetime and validated at
//! initialization. `WaveParams` and `ExecutionMode` are supplied per frame.

use crate::constants::{adjacency, scheduling, waves};
use crate::error::{OceanError, OceanResult};
use crate::kernels::NormalAggregation;
use crate::wave_noise::NoiseSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OceanConfig {
    /// Triangle slots reserved per vertex in the adjacency map
    pub adjacency_capacity: usize,

    /// Minimum elements per parallel chunk
    pub batch_size: usize,

    /// Worker threads (None = one per logical CPU)
    pub worker_threads: Option<usize>,

    /// How triangle normals are folded onto vertices
    pub aggregation: NormalAggregation,

    /// Record job start/finish events for inspection
    pub record_trace: bool,

    /// Height noise used by the displacement kernel
    pub noise: NoiseSource,
}

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            adjacency_capacity: adjacency::DEFAULT_CAPACITY,
            batch_size: scheduling::DEFAULT_BATCH_SIZE,
            worker_threads: None,
            aggregation: NormalAggregation::default(),
            record_trace: false,
            noise: NoiseSource::default(),
        }
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> OceanError {
    OceanError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl OceanConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> OceanResult<()> {
        if self.adjacency_capacity == 0 {
            return Err(invalid(
                "adjacency_capacity",
                self.adjacency_capacity,
                "must be at least 1",
            ));
        }

        if self.adjacency_capacity > adjacency::MAX_CAPACITY {
            return Err(invalid(
                "adjacency_capacity",
                self.adjacency_capacity,
                &format!("exceeds maximum of {}", adjacency::MAX_CAPACITY),
            ));
        }

        if self.batch_size == 0 {
            return Err(invalid("batch_size", self.batch_size, "must be at least 1"));
        }

        if let Some(threads) = self.worker_threads {
            if threads == 0 || threads > scheduling::MAX_WORKER_THREADS {
                return Err(invalid(
                    "worker_threads",
                    threads,
                    &format!("must be within 1..={}", scheduling::MAX_WORKER_THREADS),
                ));
            }
        }

        log::info!(
            "[OceanConfig] Validated: adjacency_capacity={}, batch_size={}, worker_threads={}, aggregation={:?}, noise={:?}",
            self.adjacency_capacity,
            self.batch_size,
            self.resolved_worker_threads(),
            self.aggregation,
            self.noise
        );
        Ok(())
    }

    /// Worker count after applying the CPU-count default
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> OceanResult<Self> {
        let config: OceanConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> OceanResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| OceanError::IoError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&source).map_err(|e| {
            log::error!("[OceanConfig::load] Rejected {}: {}", path.display(), e);
            e
        })
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> OceanResult<String> {
        toml::to_string(self).map_err(|e| OceanError::ConfigParse {
            context: "OceanConfig".to_string(),
            error: e.to_string(),
        })
    }
}

/// Per-frame scalar inputs from the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    /// Elapsed host time in seconds
    pub time: f32,

    /// Multiplier applied to `time`
    pub time_multiplier: f32,

    /// Weight of the noise term
    pub perlin_strength: f32,

    /// Weight of the radial ripple term
    pub ripple_strength: f32,

    /// Noise frequency
    pub scale: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            time: 0.0,
            time_multiplier: waves::DEFAULT_TIME_MULTIPLIER,
            perlin_strength: waves::DEFAULT_PERLIN_STRENGTH,
            ripple_strength: waves::DEFAULT_RIPPLE_STRENGTH,
            scale: waves::DEFAULT_SCALE,
        }
    }
}

impl WaveParams {
    /// Same parameters at another host time
    pub fn at_time(self, time: f32) -> Self {
        Self { time, ..self }
    }

    /// Time value the kernel actually sees
    #[inline]
    pub fn effective_time(&self) -> f32 {
        self.time * self.time_multiplier
    }
}

/// Where a frame's kernels execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Run inline on the calling thread before `advance_frame` returns
    Immediate,
    /// Schedule on the worker pool and overlap with the next frame
    #[default]
    Deferred,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = OceanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.adjacency_capacity, 6);
        assert_eq!(config.batch_size, 64);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = OceanConfig {
            adjacency_capacity: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(OceanError::InvalidConfig { field, .. }) => assert_eq!(field, "adjacency_capacity"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_zero_batch_and_threads() {
        let config = OceanConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = OceanConfig {
            worker_threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = OceanConfig::from_toml_str(
            r#"
            adjacency_capacity = 8
            aggregation = "average_by_count"

            [noise]
            kind = "classic"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.adjacency_capacity, 8);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.aggregation, NormalAggregation::AverageByCount);
        assert_eq!(config.noise, NoiseSource::Classic);
    }

    #[test]
    fn test_toml_validation_applies() {
        let result = OceanConfig::from_toml_str("batch_size = 0");
        assert!(matches!(result, Err(OceanError::InvalidConfig { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let original = OceanConfig {
            worker_threads: Some(2),
            record_trace: true,
            ..Default::default()
        };

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let text = original.to_toml_string().expect("serialize");
        file.write_all(text.as_bytes()).expect("write");

        let loaded = OceanConfig::load(file.path()).expect("load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_missing_file() {
        let result = OceanConfig::load("/nonexistent/ocean.toml");
        assert!(matches!(result, Err(OceanError::IoError { .. })));
    }

    #[test]
    fn test_effective_time() {
        let params = WaveParams {
            time_multiplier: 0.5,
            ..Default::default()
        }
        .at_time(4.0);
        assert_eq!(params.effective_time(), 2.0);
    }
}
