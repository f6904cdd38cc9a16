use serde::{Deserialize, Serialize};

/// Default cap on consecutive rejected samples before a run is declared
/// infeasible. Far above what the default configuration ever needs.
pub const DEFAULT_MAX_ATTEMPTS: u64 = 50_000_000;

/// Packing run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    /// Number of placements to produce.
    pub target_count: usize,
    /// Smallest accepted radius. Doubles as the minimum surface gap.
    pub min_radius: f32,
    /// Radii are clamped to this value.
    pub max_radius: f32,
    /// Placements per emitted batch.
    pub batch_size: usize,
    /// Consecutive rejected samples allowed before giving up.
    /// `None` samples forever.
    pub max_attempts: Option<u64>,
    /// Fixed RNG seed. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            target_count: cubefield_common::N,
            min_radius: cubefield_common::MIN_R,
            max_radius: cubefield_common::MAX_R,
            batch_size: cubefield_common::N_PER_CHUNK,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            seed: None,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("target count must be at least 1")]
    ZeroTarget,
    #[error("batch size must be at least 1")]
    ZeroBatch,
    #[error("radius bounds must be finite and positive: min={min}, max={max}")]
    InvalidRadius { min: f32, max: f32 },
    #[error("min radius {min} exceeds max radius {max}")]
    InvertedRadius { min: f32, max: f32 },
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
}

impl PackConfig {
    /// Default bounds with a different target count.
    pub fn with_target(target_count: usize) -> Self {
        Self {
            target_count,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_count == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        let (min, max) = (self.min_radius, self.max_radius);
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || max <= 0.0 {
            return Err(ConfigError::InvalidRadius { min, max });
        }
        if min > max {
            return Err(ConfigError::InvertedRadius { min, max });
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(())
    }

    /// Number of batches a complete run emits.
    pub fn batch_count(&self) -> usize {
        self.target_count.div_ceil(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = PackConfig::default();
        assert_eq!(config.target_count, 6000);
        assert_eq!(config.min_radius, 0.003);
        assert_eq!(config.max_radius, 0.3);
        assert_eq!(config.batch_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let zero = PackConfig::with_target(0);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroTarget));

        let batch = PackConfig {
            batch_size: 0,
            ..PackConfig::default()
        };
        assert_eq!(batch.validate(), Err(ConfigError::ZeroBatch));

        let inverted = PackConfig {
            min_radius: 0.5,
            max_radius: 0.1,
            ..PackConfig::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvertedRadius { .. })
        ));

        let nan = PackConfig {
            min_radius: f32::NAN,
            ..PackConfig::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(ConfigError::InvalidRadius { .. })
        ));

        let attempts = PackConfig {
            max_attempts: Some(0),
            ..PackConfig::default()
        };
        assert_eq!(attempts.validate(), Err(ConfigError::ZeroAttempts));
    }

    #[test]
    fn batch_count_rounds_up() {
        assert_eq!(PackConfig::with_target(40).batch_count(), 2);
        assert_eq!(PackConfig::with_target(45).batch_count(), 3);
        assert_eq!(PackConfig::with_target(1).batch_count(), 1);
    }
}
