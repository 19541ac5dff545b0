use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PlateError, Result};

/// Edge-map preprocessing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Gaussian kernel size, odd
    pub kernel_size: u32,
    /// Gaussian sigma. Values <= 0 derive sigma from `kernel_size`.
    pub sigma: f32,
    /// Canny hysteresis thresholds
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 0.0,
            low_threshold: 50.0,
            high_threshold: 200.0,
        }
    }
}

impl PreprocessConfig {
    /// Sigma actually used for blurring
    pub fn effective_sigma(&self) -> f32 {
        if self.sigma > 0.0 {
            self.sigma
        } else {
            sigma_for_kernel(self.kernel_size)
        }
    }
}

/// Sigma implied by a kernel size when none is given
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Geometric heuristics for plate candidates. Both comparisons are strict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Bounding boxes must have `width * height` above this
    pub min_area: u64,
    /// Bounding boxes must have `width > height * min_aspect_ratio`
    pub min_aspect_ratio: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area: 1000,
            min_aspect_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Worker threads for per-region recognition. None uses all available cores.
    pub workers: Option<usize>,
    /// Upper bound on a single region's recognition
    pub region_timeout_ms: u64,
    /// Directory holding the OCR models
    pub models_dir: Option<PathBuf>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            region_timeout_ms: 10_000,
            models_dir: None,
        }
    }
}

impl RecognizerConfig {
    pub fn region_timeout(&self) -> Duration {
        Duration::from_millis(self.region_timeout_ms)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub preprocess: PreprocessConfig,
    pub detector: DetectorConfig,
    pub recognizer: RecognizerConfig,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.preprocess;
        if p.kernel_size == 0 || p.kernel_size % 2 == 0 {
            return Err(PlateError::Config(format!(
                "kernel_size must be odd and positive, got {}",
                p.kernel_size
            )));
        }
        if p.low_threshold < 0.0 || p.low_threshold > p.high_threshold {
            return Err(PlateError::Config(format!(
                "thresholds must satisfy 0 <= low <= high, got {} / {}",
                p.low_threshold, p.high_threshold
            )));
        }
        if self.detector.min_aspect_ratio <= 0.0 {
            return Err(PlateError::Config("min_aspect_ratio must be positive".into()));
        }
        if self.recognizer.workers == Some(0) {
            return Err(PlateError::Config("workers must be at least 1".into()));
        }
        if self.recognizer.region_timeout_ms == 0 {
            return Err(PlateError::Config("region_timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
