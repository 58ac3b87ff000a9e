use crate::error::SlicerError;

/// Slicer parameters in user-facing units (dB and milliseconds).
#[derive(Debug, Clone, PartialEq)]
pub struct SlicerConfig {
    /// RMS level in dB below which a frame counts as silent.
    pub threshold_db: f32,
    /// Minimum length of a non-edge chunk.
    pub min_length_ms: u32,
    /// Minimum length of a silent run before it may host a cut.
    pub min_interval_ms: u32,
    /// Analysis hop.
    pub hop_size_ms: u32,
    /// Maximum silence kept around a cut.
    pub max_sil_kept_ms: u32,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            threshold_db: -40.0,
            min_length_ms: 5000,
            min_interval_ms: 300,
            hop_size_ms: 10,
            max_sil_kept_ms: 500,
        }
    }
}

impl SlicerConfig {
    /// Check the orderings that do not depend on the sampling rate:
    /// `min_length >= min_interval >= hop_size` and `max_sil_kept >= hop_size`.
    pub fn validate(&self) -> Result<(), SlicerError> {
        if self.hop_size_ms == 0 {
            return Err(SlicerError::InvalidConfiguration(
                "hop_size must be greater than 0".to_string(),
            ));
        }
        if !self.threshold_db.is_finite() {
            return Err(SlicerError::InvalidConfiguration(format!(
                "threshold must be a finite dB value, got {}",
                self.threshold_db
            )));
        }
        if self.min_interval_ms < self.hop_size_ms {
            return Err(SlicerError::InvalidConfiguration(format!(
                "min_interval ({} ms) must be >= hop_size ({} ms)",
                self.min_interval_ms, self.hop_size_ms
            )));
        }
        if self.min_length_ms < self.min_interval_ms {
            return Err(SlicerError::InvalidConfiguration(format!(
                "min_length ({} ms) must be >= min_interval ({} ms)",
                self.min_length_ms, self.min_interval_ms
            )));
        }
        if self.max_sil_kept_ms < self.hop_size_ms {
            return Err(SlicerError::InvalidConfiguration(format!(
                "max_sil_kept ({} ms) must be >= hop_size ({} ms)",
                self.max_sil_kept_ms, self.hop_size_ms
            )));
        }
        Ok(())
    }
}
