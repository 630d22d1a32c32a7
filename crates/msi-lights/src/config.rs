//! Query configuration and validation

use crate::{
    ExposureError, Result, DEFAULT_MIN_DISTANCE_M, DEFAULT_RADIUS_M, DEFAULT_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Handling of a location that coincides with a lamp (distance 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DistancePolicy {
    /// Distances below `min_distance_m` are raised to it
    Floor { min_distance_m: f64 },
    /// Lights at zero distance are dropped from the ranking
    Reject,
}

impl Default for DistancePolicy {
    fn default() -> Self {
        DistancePolicy::Floor {
            min_distance_m: DEFAULT_MIN_DISTANCE_M,
        }
    }
}

/// Parameters shared by every location query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Search radius around each location in meters (default: 150)
    pub radius_m: f64,
    /// Minimum share of the running total a light must keep, in [0, 1)
    pub threshold: f64,
    /// Zero-distance handling (default: floor at 1 m)
    pub distance_policy: DistancePolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            threshold: DEFAULT_THRESHOLD,
            distance_policy: DistancePolicy::default(),
        }
    }
}

impl QueryConfig {
    pub fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_distance_policy(mut self, policy: DistancePolicy) -> Self {
        self.distance_policy = policy;
        self
    }

    /// Reject configurations no query could run with
    pub fn validate(&self) -> Result<()> {
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(ExposureError::InvalidRadius(self.radius_m));
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ExposureError::InvalidThreshold(self.threshold));
        }
        if let DistancePolicy::Floor { min_distance_m } = self.distance_policy {
            if !(min_distance_m.is_finite() && min_distance_m > 0.0) {
                return Err(ExposureError::InvalidDistanceFloor(min_distance_m));
            }
        }
        Ok(())
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading query configuration from {:?}", path);

        let reader = BufReader::new(File::open(path)?);
        let config: QueryConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = QueryConfig::default();
        assert_eq!(config.radius_m, 150.0);
        assert_eq!(config.threshold, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_radius() {
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = QueryConfig::default().with_radius(radius).validate().unwrap_err();
            assert!(matches!(err, ExposureError::InvalidRadius(_)));
        }
    }

    #[test]
    fn test_invalid_threshold() {
        for threshold in [-0.1, 1.0, 1.5, f64::NAN] {
            let err = QueryConfig::default()
                .with_threshold(threshold)
                .validate()
                .unwrap_err();
            assert!(matches!(err, ExposureError::InvalidThreshold(_)));
        }
        assert!(QueryConfig::default().with_threshold(0.999).validate().is_ok());
    }

    #[test]
    fn test_invalid_floor() {
        let config = QueryConfig::default()
            .with_distance_policy(DistancePolicy::Floor { min_distance_m: 0.0 });
        assert!(matches!(
            config.validate().unwrap_err(),
            ExposureError::InvalidDistanceFloor(_)
        ));
        let reject = QueryConfig::default().with_distance_policy(DistancePolicy::Reject);
        assert!(reject.validate().is_ok());
    }

    #[test]
    fn test_from_json_file_partial() {
        let json = r#"{"radius_m": 75.0, "distance_policy": {"policy": "reject"}}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = QueryConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.radius_m, 75.0);
        assert_eq!(config.threshold, 0.0);
        assert_eq!(config.distance_policy, DistancePolicy::Reject);
    }

    #[test]
    fn test_from_json_file_rejects_invalid() {
        let json = r#"{"threshold": 1.0}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        assert!(QueryConfig::from_json_file(file.path()).is_err());
    }
}
